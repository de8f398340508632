//! 版本持久化流程 - 流程层
//!
//! 核心职责：定义"一次试验"落库的完整流程
//!
//! 流程顺序：
//! 1. create_version（存储分配下一个版本号）
//! 2. 写入题目顺序
//! 3. 写入选项顺序
//! 4. 任一步写入失败 → 删除已创建的版本并跳过，批次继续

use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::VersionStore;
use crate::models::{GeneratedVersion, MaterializedVersion, TestId, VersionRecord};
use crate::workflow::version_ctx::VersionCtx;

/// 试验处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// 已持久化
    Success(GeneratedVersion),
    /// 跳过（写入失败，已回滚）
    Skipped,
}

/// 版本持久化流程
///
/// - 不做任何随机计算，只负责编号与写入
/// - 不持有存储，只借用
pub struct VersionFlow<'a, S: VersionStore + ?Sized> {
    store: &'a S,
    verbose_logging: bool,
}

impl<'a, S: VersionStore + ?Sized> VersionFlow<'a, S> {
    pub fn new(store: &'a S, verbose_logging: bool) -> Self {
        Self {
            store,
            verbose_logging,
        }
    }

    /// 持久化一次试验
    ///
    /// 任何一步写入失败都只跳过本次试验：
    /// - 创建主记录失败：没有写入任何数据，直接返回 `Skipped`
    /// - 嵌套行写入失败：整体删除该版本后返回 `Skipped`
    pub async fn run(
        &self,
        ctx: &VersionCtx,
        test_id: TestId,
        version: &MaterializedVersion,
    ) -> ProcessResult {
        let record = match self.store.create_version(test_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("{} ⚠️ 创建版本记录失败，跳过: {}", ctx, e);
                return ProcessResult::Skipped;
            }
        };
        debug!("{} 分配版本号 #{} (id {})", ctx, record.version_number, record.id);

        if let Err(e) = self.write_rows(&record, version).await {
            warn!(
                "{} ⚠️ 版本 #{} 写入失败，回滚并跳过: {}",
                ctx, record.version_number, e
            );
            self.rollback(ctx, &record).await;
            return ProcessResult::Skipped;
        }

        if self.verbose_logging {
            let order: Vec<_> = version.questions.iter().map(|q| q.question_id).collect();
            debug!("{} 题目顺序: {:?}", ctx, order);
        }
        info!(
            "{} ✓ 版本 #{} 已保存 ({} 题)",
            ctx,
            record.version_number,
            version.question_count()
        );

        ProcessResult::Success(GeneratedVersion {
            id: record.id,
            version_number: record.version_number,
            question_count: version.question_count(),
        })
    }

    async fn write_rows(
        &self,
        record: &VersionRecord,
        version: &MaterializedVersion,
    ) -> AppResult<()> {
        self.store
            .save_question_order(record.id, &version.question_slots())
            .await?;
        self.store
            .save_choice_order(record.id, &version.choice_slots())
            .await?;
        Ok(())
    }

    async fn rollback(&self, ctx: &VersionCtx, record: &VersionRecord) {
        if let Err(e) = self.store.delete_version(record.id).await {
            error!(
                "{} ❌ 回滚版本 #{} (id {}) 失败: {}",
                ctx, record.version_number, record.id, e
            );
        }
    }
}
