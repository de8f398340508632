//! 批量题库处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行运行的入口，负责一整个题库目录的处理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建日志文件、内存存储和版本服务
//! 2. **批量加载**：扫描并加载所有题库文件（`Vec<QuestionBank>`）
//! 3. **逐个测试生成**：每个测试生成固定数量的版本
//! 4. **答案键与告警**：重建每个版本的答案键，告警写入 warn.txt
//! 5. **导出**：每个测试导出一个 JSON 文件（预览 + 答案键）
//! 6. **全局统计**：汇总所有测试的处理结果

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::MemoryStore;
use crate::models::{load_all_bank_files, AnswerKey, QuestionBank, TestId, VersionPreview};
use crate::orchestrator::version_processor::VersionService;
use crate::services::WarnWriter;
use crate::utils::logging;

/// 导出文件中的一个版本
#[derive(Debug, Serialize)]
pub struct ExportedVersion {
    pub preview: VersionPreview,
    pub answer_key: AnswerKey,
}

/// 一个测试的导出文件
#[derive(Debug, Serialize)]
pub struct TestExport {
    pub test_id: TestId,
    pub title: String,
    pub versions: Vec<ExportedVersion>,
}

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub tests: usize,
    pub failed_tests: usize,
    pub generated: usize,
    pub skipped: usize,
    pub warnings: usize,
}

/// 单个测试的处理结果
#[derive(Debug, Default)]
struct TestResult {
    generated: usize,
    skipped: usize,
    warnings: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    service: VersionService<MemoryStore>,
    warn_writer: WarnWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        logging::log_startup(config.versions_per_test, config.max_concurrent_trials);

        let store = Arc::new(MemoryStore::new());
        let service = VersionService::new(store, &config);
        let warn_writer = WarnWriter::with_path(&config.warn_file);

        Ok(Self {
            config,
            service,
            warn_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        info!("\n📁 正在扫描题库目录: {}", self.config.bank_folder);
        let banks = load_all_bank_files(&self.config.bank_folder).await?;

        if banks.is_empty() {
            warn!("⚠️ 没有找到待处理的题库文件，程序结束");
            return Ok(RunStats::default());
        }
        logging::log_banks_loaded(banks.len());

        tokio::fs::create_dir_all(&self.config.export_folder)
            .await
            .with_context(|| format!("无法创建导出目录: {}", self.config.export_folder))?;

        let mut stats = RunStats::default();
        for bank in banks {
            let test_id = bank.test_id;
            stats.tests += 1;
            match self.process_test(bank).await {
                Ok(result) => {
                    stats.generated += result.generated;
                    stats.skipped += result.skipped;
                    stats.warnings += result.warnings;
                }
                Err(e) => {
                    error!("[测试 {}] ❌ 处理过程中发生错误: {:#}", test_id, e);
                    stats.failed_tests += 1;
                }
            }
        }

        logging::print_final_stats(
            stats.tests,
            stats.failed_tests,
            stats.generated,
            stats.skipped,
            stats.warnings,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 处理单个测试：生成版本 → 答案键 → 导出
    async fn process_test(&self, bank: QuestionBank) -> Result<TestResult> {
        let test_id = bank.test_id;
        let title = bank.title.clone();
        let requested = self.config.versions_per_test;

        logging::log_batch_start(
            test_id,
            &logging::truncate_text(&title, 30),
            requested,
            bank.len(),
        );

        self.service.store().put_bank(bank).await;
        self.service.invalidate_bank(test_id);

        let generated = self
            .service
            .generate_versions(test_id, requested, self.config.questions_per_version)
            .await
            .with_context(|| format!("测试 {} 生成版本失败", test_id))?;

        let mut result = TestResult {
            generated: generated.len(),
            skipped: requested as usize - generated.len(),
            ..Default::default()
        };

        let mut versions = Vec::with_capacity(generated.len());
        for version in &generated {
            let preview = self.service.get_version(version.id).await?;
            let answer_key = self.service.answer_key(version.id).await?;

            result.warnings += answer_key.warnings.len();
            self.warn_writer
                .write(test_id, version.version_number, &answer_key.warnings)
                .await?;

            versions.push(ExportedVersion {
                preview,
                answer_key,
            });
        }

        let export = TestExport {
            test_id,
            title,
            versions,
        };
        let path = self.export_path(test_id);
        let json = serde_json::to_string_pretty(&export)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("写入导出文件失败: {}", path.display()))?;
        info!("💾 已导出: {}", path.display());

        logging::log_batch_complete(test_id, result.generated, requested);

        Ok(result)
    }

    fn export_path(&self, test_id: TestId) -> PathBuf {
        PathBuf::from(&self.config.export_folder).join(format!("test_{}_versions.json", test_id))
    }
}
