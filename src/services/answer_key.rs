//! 答案键重建 - 业务能力层
//!
//! 把已持久化的版本顺序与题库中的标准答案关联，得到该版本下每题的答案：
//! - 选择类题型：标准答案选项在本版本选项顺序中的位置 → 字母（0 → A）
//! - 其他题型：标准答案原文，不受顺序影响
//!
//! 单题数据不完整时只跳过该题，不让整个请求失败：
//! - 没有标准答案：直接省略
//! - 标准答案选项找不到：省略并记录告警

use tracing::{debug, warn};

use crate::models::{
    AnswerKey, AnswerKeyEntry, CorrectAnswer, KeyAnswer, KeyWarning, KeyWarningReason,
    PersistedQuestion, PersistedVersion, Question, QuestionBank,
};

/// 0 → "A"，25 → "Z"，26 → "AA"
pub fn choice_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 选项在版本内的 0 基位置（按 `choice_order` 计算，不依赖行的存放顺序）
fn position_in_version(persisted: &PersistedQuestion, choice_id: i64) -> Option<usize> {
    let slot = persisted.choices.iter().find(|c| c.choice_id == choice_id)?;
    Some(
        persisted
            .choices
            .iter()
            .filter(|c| c.choice_order < slot.choice_order)
            .count(),
    )
}

fn resolve(
    persisted: &PersistedQuestion,
    question: &Question,
    answer: &CorrectAnswer,
) -> Result<KeyAnswer, KeyWarningReason> {
    match answer {
        CorrectAnswer::Text(text) => Ok(KeyAnswer::Text(text.clone())),
        CorrectAnswer::ChoiceId(choice_id) if question.question_type.is_choice_bearing() => {
            position_in_version(persisted, *choice_id)
                .map(|position| KeyAnswer::Letter(choice_letter(position)))
                .ok_or(KeyWarningReason::ChoiceNotInVersion {
                    choice_id: *choice_id,
                })
        }
        CorrectAnswer::ChoiceId(choice_id) => question
            .choice(*choice_id)
            .map(|choice| KeyAnswer::Text(choice.text.clone()))
            .ok_or(KeyWarningReason::ChoiceNotInBank {
                choice_id: *choice_id,
            }),
    }
}

/// 重建某个版本的答案键
pub fn reconstruct_answer_key(version: &PersistedVersion, bank: &QuestionBank) -> AnswerKey {
    let answers = bank.answer_index();
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    let mut ordered: Vec<&PersistedQuestion> = version.questions.iter().collect();
    ordered.sort_by_key(|q| q.question_order);

    for persisted in ordered {
        let Some(question) = bank.question(persisted.question_id) else {
            warnings.push(KeyWarning {
                question_order: persisted.question_order,
                question_id: persisted.question_id,
                reason: KeyWarningReason::QuestionNotInBank,
            });
            continue;
        };

        let Some(answer) = answers.get(&question.id) else {
            debug!(
                "版本 #{} 第 {} 题 (题目 {}) 没有标准答案，跳过",
                version.record.version_number, persisted.question_order, question.id
            );
            continue;
        };

        match resolve(persisted, question, answer) {
            Ok(answer) => entries.push(AnswerKeyEntry {
                question_order: persisted.question_order,
                question_id: question.id,
                answer,
            }),
            Err(reason) => warnings.push(KeyWarning {
                question_order: persisted.question_order,
                question_id: question.id,
                reason,
            }),
        }
    }

    for warning in &warnings {
        warn!(
            "⚠️ 版本 #{} 第 {} 题 (题目 {}): {}",
            version.record.version_number,
            warning.question_order,
            warning.question_id,
            warning.reason
        );
    }

    AnswerKey {
        version_id: version.record.id,
        version_number: version.record.version_number,
        entries,
        warnings,
    }
}
