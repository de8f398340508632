//! 告警写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::Result;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{KeyWarning, TestId};

/// 告警写入服务
///
/// 职责：
/// - 把答案键中无法给出答案的题目追加写入 warn.txt
/// - 每条告警一行
pub struct WarnWriter {
    warn_file_path: PathBuf,
}

impl WarnWriter {
    pub fn new() -> Self {
        Self::with_path("warn.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.warn_file_path
    }

    /// 写入某个版本的全部告警，没有告警时不触碰文件
    pub async fn write(
        &self,
        test_id: TestId,
        version_number: u32,
        warnings: &[KeyWarning],
    ) -> Result<()> {
        if warnings.is_empty() {
            return Ok(());
        }

        debug!(
            "写入告警: 测试 {} | 版本 #{} | {} 条",
            test_id,
            version_number,
            warnings.len()
        );

        let mut lines = String::new();
        for warning in warnings {
            lines.push_str(&format!(
                "测试 {} | 版本 #{} | 第 {} 题 (题目 {}) | {}\n",
                test_id,
                version_number,
                warning.question_order,
                warning.question_id,
                warning.reason
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeyWarningReason;

    #[tokio::test]
    async fn test_write_appends_one_line_per_warning() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WarnWriter::with_path(dir.path().join("warn.txt"));
        let warnings = vec![
            KeyWarning {
                question_order: 2,
                question_id: 20,
                reason: KeyWarningReason::ChoiceNotInVersion { choice_id: 201 },
            },
            KeyWarning {
                question_order: 5,
                question_id: 50,
                reason: KeyWarningReason::QuestionNotInBank,
            },
        ];

        writer.write(1, 3, &warnings).await.unwrap();
        writer.write(1, 4, &warnings[..1]).await.unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("版本 #3"));
        assert!(lines[0].contains("201"));
        assert!(lines[2].contains("版本 #4"));
    }

    #[test]
    fn test_default_path_and_empty_write() {
        let writer = WarnWriter::default();
        assert_eq!(writer.path(), std::path::Path::new("warn.txt"));

        tokio_test::block_on(writer.write(1, 1, &[])).unwrap();
    }

    #[tokio::test]
    async fn test_no_warnings_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WarnWriter::with_path(dir.path().join("warn.txt"));

        writer.write(1, 1, &[]).await.unwrap();

        assert!(!writer.path().exists());
    }
}
