//! 版本相关的数据结构
//!
//! - `MaterializedVersion`：打乱完成、尚未持久化的一个版本
//! - `PersistedVersion`：从存储读回的版本（题目顺序 + 每题选项顺序）
//! - `AnswerKey` / `VersionPreview`：面向导出与预览的派生结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::QuestionType;
use crate::models::{ChoiceId, QuestionId, TestId, VersionId};

/// 版本内已排序的选项（顺序从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedChoice {
    pub choice_id: ChoiceId,
    pub choice_order: usize,
}

/// 版本内已排序的题目（顺序从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedQuestion {
    pub question_id: QuestionId,
    pub question_order: usize,
    pub part: Option<i64>,
    pub question_type: QuestionType,
    pub choices: Vec<OrderedChoice>,
}

/// 一次完整打乱的结果，等待持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedVersion {
    pub questions: Vec<OrderedQuestion>,
}

impl MaterializedVersion {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 题目顺序行
    pub fn question_slots(&self) -> Vec<QuestionSlot> {
        self.questions
            .iter()
            .map(|q| QuestionSlot {
                question_id: q.question_id,
                question_order: q.question_order,
            })
            .collect()
    }

    /// 选项顺序行（按题目顺序展开）
    pub fn choice_slots(&self) -> Vec<ChoiceSlot> {
        self.questions
            .iter()
            .flat_map(|q| {
                q.choices.iter().map(move |c| ChoiceSlot {
                    question_id: q.question_id,
                    choice_id: c.choice_id,
                    choice_order: c.choice_order,
                })
            })
            .collect()
    }
}

/// 持久化的题目顺序行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSlot {
    pub question_id: QuestionId,
    pub question_order: usize,
}

/// 持久化的选项顺序行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSlot {
    pub question_id: QuestionId,
    pub choice_id: ChoiceId,
    pub choice_order: usize,
}

/// 版本主记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: VersionId,
    pub test_id: TestId,
    pub version_number: u32,
    pub created_at: DateTime<Utc>,
}

/// 从存储读回的版本题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedQuestion {
    pub question_id: QuestionId,
    pub question_order: usize,
    /// 按 `choice_order` 升序
    pub choices: Vec<ChoiceSlot>,
}

/// 从存储读回的完整版本，题目按 `question_order` 升序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVersion {
    pub record: VersionRecord,
    pub questions: Vec<PersistedQuestion>,
}

/// 批量生成时返回给调用方的版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVersion {
    pub id: VersionId,
    pub version_number: u32,
    pub question_count: usize,
}

/// 版本列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: VersionId,
    pub version_number: u32,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
}

/// 答案：选择题给出字母，主观题给出标准答案原文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KeyAnswer {
    Letter(String),
    Text(String),
}

/// 答案键中的一题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub question_order: usize,
    pub question_id: QuestionId,
    pub answer: KeyAnswer,
}

/// 无法给出答案的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum KeyWarningReason {
    /// 标准答案所指选项不在该版本的选项顺序中
    ChoiceNotInVersion { choice_id: ChoiceId },
    /// 标准答案所指选项已不在题库中
    ChoiceNotInBank { choice_id: ChoiceId },
    /// 版本引用的题目已不在题库中
    QuestionNotInBank,
}

impl std::fmt::Display for KeyWarningReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyWarningReason::ChoiceNotInVersion { choice_id } => {
                write!(f, "标准答案选项 {} 不在版本选项顺序中", choice_id)
            }
            KeyWarningReason::ChoiceNotInBank { choice_id } => {
                write!(f, "标准答案选项 {} 已不在题库中", choice_id)
            }
            KeyWarningReason::QuestionNotInBank => write!(f, "题目已不在题库中"),
        }
    }
}

/// 答案键告警
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWarning {
    pub question_order: usize,
    pub question_id: QuestionId,
    #[serde(flatten)]
    pub reason: KeyWarningReason,
}

/// 某个版本的答案键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub version_id: VersionId,
    pub version_number: u32,
    pub entries: Vec<AnswerKeyEntry>,
    #[serde(default)]
    pub warnings: Vec<KeyWarning>,
}

impl AnswerKey {
    pub fn entry_for(&self, question_order: usize) -> Option<&AnswerKeyEntry> {
        self.entries
            .iter()
            .find(|e| e.question_order == question_order)
    }
}

/// 预览中的选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewChoice {
    pub letter: String,
    pub order: usize,
    pub choice_id: ChoiceId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// 预览中的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewQuestion {
    pub question_number: usize,
    pub question_id: QuestionId,
    pub text: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<i64>,
    pub choices: Vec<PreviewChoice>,
}

/// 版本预览（导出/打印用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPreview {
    pub version_id: VersionId,
    pub version_number: u32,
    pub created_at: DateTime<Utc>,
    pub test_id: TestId,
    pub test_title: String,
    pub questions: Vec<PreviewQuestion>,
}
