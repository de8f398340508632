//! 存储边界 - 基础设施层
//!
//! 核心逻辑只通过这个 trait 读取题库、写入版本。
//! 实现方负责：
//! - `create_version` 在自身的写临界区内分配 `max(已有版本号) + 1`
//! - 删除版本时级联删除其题目顺序与选项顺序
//! - 读回的版本题目按 `question_order` 升序、选项按 `choice_order` 升序

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    ChoiceSlot, PersistedVersion, QuestionBank, QuestionSlot, TestId, VersionId, VersionRecord,
    VersionSummary,
};

#[async_trait]
pub trait VersionStore: Send + Sync {
    /// 读取测试的标准题库（题目、选项、标准答案）
    async fn load_bank(&self, test_id: TestId) -> AppResult<QuestionBank>;

    /// 创建版本主记录并分配下一个版本号
    async fn create_version(&self, test_id: TestId) -> AppResult<VersionRecord>;

    /// 写入版本的题目顺序
    async fn save_question_order(&self, version_id: VersionId, slots: &[QuestionSlot])
        -> AppResult<()>;

    /// 写入版本的选项顺序
    async fn save_choice_order(&self, version_id: VersionId, slots: &[ChoiceSlot]) -> AppResult<()>;

    /// 按版本号升序列出测试的全部版本
    async fn list_versions(&self, test_id: TestId) -> AppResult<Vec<VersionSummary>>;

    /// 读回完整版本
    async fn load_version(&self, version_id: VersionId) -> AppResult<PersistedVersion>;

    /// 整体删除版本（级联）
    async fn delete_version(&self, version_id: VersionId) -> AppResult<()>;
}
