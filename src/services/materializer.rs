//! 版本生成 - 业务能力层
//!
//! 一次调用 = 一次独立试验：
//! 1. 需要时先均匀随机抽取题目子集
//! 2. 分部打乱题目
//! 3. 逐题打乱选项
//! 4. 返回完整编号的结构，交给流程层持久化
//!
//! 多次调用之间不做去重，相同的排列在统计上可能出现。

use rand::Rng;
use tracing::debug;

use crate::error::{AppResult, ValidationError};
use crate::models::{MaterializedVersion, OrderedQuestion, Question, QuestionBank};
use crate::services::{choice_shuffler, permutation, question_shuffler};

/// 校验生成前置条件：题库非空，每版题目数（若指定）大于 0
pub fn check_preconditions(
    bank: &QuestionBank,
    questions_per_version: Option<usize>,
) -> AppResult<()> {
    if bank.is_empty() {
        return Err(ValidationError::EmptyBank {
            test_id: bank.test_id,
        }
        .into());
    }
    if questions_per_version == Some(0) {
        return Err(ValidationError::InvalidQuestionsPerVersion { requested: 0 }.into());
    }
    Ok(())
}

/// 实际使用的每版题目数：未指定或不小于题库大小时使用全部题目
pub fn effective_question_count(bank_size: usize, questions_per_version: Option<usize>) -> usize {
    match questions_per_version {
        Some(cap) if cap < bank_size => cap,
        _ => bank_size,
    }
}

/// 生成一个版本
pub fn materialize_version<R: Rng + ?Sized>(
    bank: &QuestionBank,
    questions_per_version: Option<usize>,
    rng: &mut R,
) -> AppResult<MaterializedVersion> {
    check_preconditions(bank, questions_per_version)?;

    let all: Vec<&Question> = bank.questions.iter().collect();
    let count = effective_question_count(all.len(), questions_per_version);
    let selected = if count < all.len() {
        debug!("测试 {}: 从 {} 题中抽取 {} 题", bank.test_id, all.len(), count);
        permutation::sample(&all, count, rng)
    } else {
        all
    };

    let questions = question_shuffler::shuffle_questions(&selected, rng)
        .into_iter()
        .map(|sequenced| OrderedQuestion {
            question_id: sequenced.question.id,
            question_order: sequenced.question_order,
            part: sequenced.question.part,
            question_type: sequenced.question.question_type,
            choices: choice_shuffler::shuffle_choices(sequenced.question, rng),
        })
        .collect();

    Ok(MaterializedVersion { questions })
}
