//! 版本预览 - 业务能力层
//!
//! 把持久化的顺序与题库内容拼成可展示/可导出的版本

use tracing::warn;

use crate::models::{
    PersistedQuestion, PersistedVersion, PreviewChoice, PreviewQuestion, QuestionBank,
    VersionPreview,
};
use crate::services::answer_key::choice_letter;

/// 渲染版本预览
///
/// 题库中已不存在的题目或选项会被跳过并记录警告。
pub fn render_preview(version: &PersistedVersion, bank: &QuestionBank) -> VersionPreview {
    let mut ordered: Vec<&PersistedQuestion> = version.questions.iter().collect();
    ordered.sort_by_key(|q| q.question_order);

    let mut questions = Vec::with_capacity(ordered.len());
    for persisted in ordered {
        let Some(question) = bank.question(persisted.question_id) else {
            warn!(
                "版本 #{} 引用的题目 {} 已不在题库中，预览中跳过",
                version.record.version_number, persisted.question_id
            );
            continue;
        };

        let mut slots = persisted.choices.clone();
        slots.sort_by_key(|c| c.choice_order);

        let mut choices = Vec::with_capacity(slots.len());
        // 字母按版本内位置计算，与答案键保持一致
        for (position, slot) in slots.into_iter().enumerate() {
            match question.choice(slot.choice_id) {
                Some(choice) => choices.push(PreviewChoice {
                    letter: choice_letter(position),
                    order: slot.choice_order,
                    choice_id: choice.id,
                    text: choice.text.clone(),
                    image_url: choice.image_url.clone(),
                }),
                None => warn!(
                    "版本 #{} 题目 {} 的选项 {} 已不在题库中，预览中跳过",
                    version.record.version_number, question.id, slot.choice_id
                ),
            }
        }

        questions.push(PreviewQuestion {
            question_number: persisted.question_order,
            question_id: question.id,
            text: question.text.clone(),
            question_type: question.question_type,
            part: question.part,
            choices,
        });
    }

    VersionPreview {
        version_id: version.record.id,
        version_number: version.record.version_number,
        created_at: version.record.created_at,
        test_id: bank.test_id,
        test_title: bank.title.clone(),
        questions,
    }
}
