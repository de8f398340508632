use crate::models::question::QuestionBank;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载题库
pub async fn load_bank_file(toml_file_path: &Path) -> Result<QuestionBank> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let bank: QuestionBank = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    bank.validate()
        .with_context(|| format!("题库校验失败: {}", toml_file_path.display()))?;

    Ok(bank)
}

/// 从文件夹中加载所有 TOML 题库文件
///
/// 无法读取或解析的文件会被跳过并记录警告。返回结果按文件名排序。
pub async fn load_all_bank_files(folder_path: &str) -> Result<Vec<QuestionBank>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut banks = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_bank_file(&path).await {
            Ok(bank) => {
                tracing::info!("成功加载测试 {}，共 {} 个题目", bank.test_id, bank.len());
                banks.push(bank);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(banks)
}
