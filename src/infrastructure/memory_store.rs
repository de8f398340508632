//! 进程内存储 - 基础设施层
//!
//! `VersionStore` 的内存实现，供命令行运行和测试使用。
//! 所有写操作都在同一把写锁内完成，版本号分配天然串行。

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult, StoreError};
use crate::infrastructure::version_store::VersionStore;
use crate::models::{
    ChoiceSlot, PersistedQuestion, PersistedVersion, QuestionBank, QuestionSlot, TestId, VersionId,
    VersionRecord, VersionSummary,
};

#[derive(Debug, Default)]
struct Tables {
    banks: HashMap<TestId, QuestionBank>,
    versions: BTreeMap<VersionId, VersionRecord>,
    question_rows: HashMap<VersionId, Vec<QuestionSlot>>,
    choice_rows: HashMap<VersionId, Vec<ChoiceSlot>>,
    next_version_id: VersionId,
}

impl Tables {
    fn version(&self, version_id: VersionId) -> AppResult<&VersionRecord> {
        self.versions
            .get(&version_id)
            .ok_or_else(|| StoreError::VersionNotFound { version_id }.into())
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入（或替换）测试的题库
    pub async fn put_bank(&self, bank: QuestionBank) {
        let mut tables = self.tables.write().await;
        debug!("写入测试 {} 的题库 ({} 题)", bank.test_id, bank.len());
        tables.banks.insert(bank.test_id, bank);
    }

    /// 修改已存在的题库（模拟题目/选项在版本生成后被编辑）
    pub async fn update_bank<F>(&self, test_id: TestId, edit: F) -> AppResult<()>
    where
        F: FnOnce(&mut QuestionBank) + Send,
    {
        let mut tables = self.tables.write().await;
        let bank = tables
            .banks
            .get_mut(&test_id)
            .ok_or(StoreError::TestNotFound { test_id })?;
        edit(bank);
        Ok(())
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn load_bank(&self, test_id: TestId) -> AppResult<QuestionBank> {
        let tables = self.tables.read().await;
        tables
            .banks
            .get(&test_id)
            .cloned()
            .ok_or_else(|| StoreError::TestNotFound { test_id }.into())
    }

    async fn create_version(&self, test_id: TestId) -> AppResult<VersionRecord> {
        let mut tables = self.tables.write().await;
        if !tables.banks.contains_key(&test_id) {
            return Err(StoreError::TestNotFound { test_id }.into());
        }

        let version_number = tables
            .versions
            .values()
            .filter(|v| v.test_id == test_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        tables.next_version_id += 1;
        let record = VersionRecord {
            id: tables.next_version_id,
            test_id,
            version_number,
            created_at: Utc::now(),
        };
        tables.versions.insert(record.id, record.clone());

        Ok(record)
    }

    async fn save_question_order(
        &self,
        version_id: VersionId,
        slots: &[QuestionSlot],
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.version(version_id)?;

        let mut orders = HashSet::new();
        if !slots.iter().all(|s| orders.insert(s.question_order)) {
            return Err(AppError::write_failed(
                "test_version_questions",
                "同一版本中题目顺序重复",
            ));
        }

        tables
            .question_rows
            .entry(version_id)
            .or_default()
            .extend_from_slice(slots);
        Ok(())
    }

    async fn save_choice_order(
        &self,
        version_id: VersionId,
        slots: &[ChoiceSlot],
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.version(version_id)?;

        let known: HashSet<_> = tables
            .question_rows
            .get(&version_id)
            .map(|rows| rows.iter().map(|r| r.question_id).collect())
            .unwrap_or_default();
        if let Some(orphan) = slots.iter().find(|s| !known.contains(&s.question_id)) {
            return Err(AppError::write_failed(
                "test_versions_answer_choices",
                format!("题目 {} 不在版本 {} 中", orphan.question_id, version_id),
            ));
        }

        tables
            .choice_rows
            .entry(version_id)
            .or_default()
            .extend_from_slice(slots);
        Ok(())
    }

    async fn list_versions(&self, test_id: TestId) -> AppResult<Vec<VersionSummary>> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<VersionSummary> = tables
            .versions
            .values()
            .filter(|v| v.test_id == test_id)
            .map(|v| VersionSummary {
                id: v.id,
                version_number: v.version_number,
                created_at: v.created_at,
                question_count: tables.question_rows.get(&v.id).map_or(0, Vec::len),
            })
            .collect();
        summaries.sort_by_key(|s| s.version_number);
        Ok(summaries)
    }

    async fn load_version(&self, version_id: VersionId) -> AppResult<PersistedVersion> {
        let tables = self.tables.read().await;
        let record = tables.version(version_id)?.clone();

        let mut choices_by_question: HashMap<_, Vec<ChoiceSlot>> = HashMap::new();
        for slot in tables.choice_rows.get(&version_id).into_iter().flatten() {
            choices_by_question
                .entry(slot.question_id)
                .or_default()
                .push(*slot);
        }

        let mut questions: Vec<PersistedQuestion> = tables
            .question_rows
            .get(&version_id)
            .into_iter()
            .flatten()
            .map(|row| {
                let mut choices = choices_by_question
                    .remove(&row.question_id)
                    .unwrap_or_default();
                choices.sort_by_key(|c| c.choice_order);
                PersistedQuestion {
                    question_id: row.question_id,
                    question_order: row.question_order,
                    choices,
                }
            })
            .collect();
        questions.sort_by_key(|q| q.question_order);

        Ok(PersistedVersion { record, questions })
    }

    async fn delete_version(&self, version_id: VersionId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .versions
            .remove(&version_id)
            .ok_or(StoreError::VersionNotFound { version_id })?;
        tables.question_rows.remove(&version_id);
        tables.choice_rows.remove(&version_id);
        Ok(())
    }
}
