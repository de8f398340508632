//! 选项打乱 - 业务能力层
//!
//! 只负责"一道题的选项排序"：
//! - 选择类题型：Fisher-Yates 打乱后编号
//! - 其他题型：保持录入顺序，仍然逐个编号（存储层要求每个选项都有显式顺序）

use rand::Rng;
use tracing::debug;

use crate::models::{OrderedChoice, Question};
use crate::services::permutation;

/// 为一道题的选项分配版本内顺序（从 1 开始）
pub fn shuffle_choices<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<OrderedChoice> {
    let choice_ids: Vec<_> = question.choices.iter().map(|c| c.id).collect();

    let arranged = if question.question_type.is_choice_bearing() {
        permutation::shuffle(&choice_ids, rng)
    } else {
        debug!(
            "题目 {} 为 {} 题型，选项保持原顺序",
            question.id, question.question_type
        );
        choice_ids
    };

    arranged
        .into_iter()
        .enumerate()
        .map(|(index, choice_id)| OrderedChoice {
            choice_id,
            choice_order: index + 1,
        })
        .collect()
}
