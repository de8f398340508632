use std::collections::{HashMap, HashSet};

use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{ChoiceId, QuestionId, TestId};

/// 题型大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// 选择类：向考生展示多个可选项，参与选项打乱
    ChoiceBearing,
    /// 主观填写类：唯一答案以一条"选项"记录保存
    FreeResponse,
    /// 组合类：子项结构有含义，不可打乱
    Composite,
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    Identification,
    FillInTheBlank,
    Essay,
    Matching,
    Rearrangement,
}

/// 规范化后的题型标签 → 题型
static QUESTION_TYPE_ALIASES: phf::Map<&'static str, QuestionType> = phf_map! {
    "multiple_choice" => QuestionType::MultipleChoice,
    "mcq" => QuestionType::MultipleChoice,
    "true_or_false" => QuestionType::TrueFalse,
    "true_false" => QuestionType::TrueFalse,
    "t_f" => QuestionType::TrueFalse,
    "identification" => QuestionType::Identification,
    "fill_in_the_blank" => QuestionType::FillInTheBlank,
    "fill_in_blank" => QuestionType::FillInTheBlank,
    "essay" => QuestionType::Essay,
    "matching" => QuestionType::Matching,
    "matching_type" => QuestionType::Matching,
    "rearrangement" => QuestionType::Rearrangement,
};

impl QuestionType {
    /// 解析题型标签（忽略大小写、空格、下划线、斜杠、连字符的差异）
    pub fn parse(tag: &str) -> AppResult<Self> {
        let separators = Regex::new(r"[\s_/\-]+").map_err(|e| AppError::Other(e.to_string()))?;
        let normalized = separators
            .replace_all(tag.trim(), "_")
            .trim_matches('_')
            .to_lowercase();

        QUESTION_TYPE_ALIASES
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| {
                ValidationError::UnknownQuestionType {
                    tag: tag.to_string(),
                }
                .into()
            })
    }

    /// 标准显示名称
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::TrueFalse => "True or False",
            QuestionType::Identification => "Identification",
            QuestionType::FillInTheBlank => "Fill in the Blank",
            QuestionType::Essay => "Essay",
            QuestionType::Matching => "Matching Type",
            QuestionType::Rearrangement => "Rearrangement",
        }
    }

    pub fn kind(self) -> QuestionKind {
        match self {
            QuestionType::MultipleChoice | QuestionType::TrueFalse => QuestionKind::ChoiceBearing,
            QuestionType::Identification | QuestionType::FillInTheBlank | QuestionType::Essay => {
                QuestionKind::FreeResponse
            }
            QuestionType::Matching | QuestionType::Rearrangement => QuestionKind::Composite,
        }
    }

    /// 是否参与选项打乱
    pub fn is_choice_bearing(self) -> bool {
        self.kind() == QuestionKind::ChoiceBearing
    }
}

impl TryFrom<String> for QuestionType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 答案选项
///
/// 选项之间没有固有顺序，顺序只在生成版本时分配。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerChoice {
    pub id: ChoiceId,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub question_type: QuestionType,
    /// 所属部分；`None` 表示未分组
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<i64>,
    #[serde(default)]
    pub choices: Vec<AnswerChoice>,
}

impl Question {
    pub fn choice(&self, choice_id: ChoiceId) -> Option<&AnswerChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

/// 标准答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectAnswer {
    /// 指向题目的某个选项
    ChoiceId(ChoiceId),
    /// 直接保存的主观题答案
    Text(String),
}

/// 题目 → 标准答案 的一对一关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLink {
    pub question_id: QuestionId,
    pub answer: CorrectAnswer,
}

/// 题库：某个测试的全部标准题目、选项和答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub test_id: TestId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<AnswerLink>,
}

impl QuestionBank {
    pub fn new(test_id: TestId, title: impl Into<String>) -> Self {
        Self {
            test_id,
            title: title.into(),
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// 题目 ID → 标准答案 的索引；同一题目重复关联时以最后一条为准
    pub fn answer_index(&self) -> HashMap<QuestionId, &CorrectAnswer> {
        self.answers
            .iter()
            .map(|link| (link.question_id, &link.answer))
            .collect()
    }

    /// 记录（或覆盖）某题的标准答案
    pub fn set_answer(&mut self, question_id: QuestionId, answer: CorrectAnswer) {
        match self.answers.iter_mut().find(|l| l.question_id == question_id) {
            Some(link) => link.answer = answer,
            None => self.answers.push(AnswerLink {
                question_id,
                answer,
            }),
        }
    }

    /// 校验题目 ID 与选项 ID 唯一
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut question_ids = HashSet::new();
        let mut choice_ids = HashSet::new();

        for question in &self.questions {
            if !question_ids.insert(question.id) {
                return Err(ValidationError::DuplicateQuestion {
                    question_id: question.id,
                });
            }
            for choice in &question.choices {
                if !choice_ids.insert(choice.id) {
                    return Err(ValidationError::DuplicateChoice {
                        question_id: question.id,
                        choice_id: choice.id,
                    });
                }
            }
        }

        Ok(())
    }
}
