//! 分部题目打乱 - 业务能力层
//!
//! 测试可以分为若干"部分"（Part I / Part II …）。每个版本中：
//! - 各部分保持连续，并按部分编号升序排列，未分组的题目排在最后
//! - 只在部分内部打乱
//! - 所有题目都没有部分编号时，整体作为一组打乱

use std::collections::BTreeMap;

use rand::Rng;

use crate::models::Question;
use crate::services::permutation;

/// 一个部分
#[derive(Debug, Clone, PartialEq)]
pub struct PartGroup<'a> {
    /// `None` 为未分组题目组成的隐式末尾组
    pub part: Option<i64>,
    pub questions: Vec<&'a Question>,
}

/// 题目的分组方式，在打乱前一次性确定
#[derive(Debug, Clone, PartialEq)]
pub enum Partitioning<'a> {
    /// 没有任何题目带部分编号
    Ungrouped(Vec<&'a Question>),
    /// 按部分编号升序分组，未分组题目（若有）为最后一组
    ByPart(Vec<PartGroup<'a>>),
}

impl<'a> Partitioning<'a> {
    pub fn of(questions: &[&'a Question]) -> Self {
        if questions.iter().all(|q| q.part.is_none()) {
            return Partitioning::Ungrouped(questions.to_vec());
        }

        let mut parts: BTreeMap<i64, Vec<&'a Question>> = BTreeMap::new();
        let mut ungrouped = Vec::new();
        for &question in questions {
            match question.part {
                Some(part) => parts.entry(part).or_default().push(question),
                None => ungrouped.push(question),
            }
        }

        let mut groups: Vec<PartGroup<'a>> = parts
            .into_iter()
            .map(|(part, questions)| PartGroup {
                part: Some(part),
                questions,
            })
            .collect();
        if !ungrouped.is_empty() {
            groups.push(PartGroup {
                part: None,
                questions: ungrouped,
            });
        }

        Partitioning::ByPart(groups)
    }

    /// 按最终拼接顺序给出各组；未分组情形即只有一组
    pub fn into_groups(self) -> Vec<Vec<&'a Question>> {
        match self {
            Partitioning::Ungrouped(questions) => vec![questions],
            Partitioning::ByPart(groups) => groups.into_iter().map(|g| g.questions).collect(),
        }
    }
}

/// 带版本内顺序的题目
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedQuestion<'a> {
    pub question_order: usize,
    pub question: &'a Question,
}

/// 分组打乱题目并分配版本内顺序（从 1 开始，跨组连续）
pub fn shuffle_questions<'a, R: Rng + ?Sized>(
    questions: &[&'a Question],
    rng: &mut R,
) -> Vec<SequencedQuestion<'a>> {
    let mut arranged = Vec::with_capacity(questions.len());
    for group in Partitioning::of(questions).into_groups() {
        arranged.extend(permutation::shuffle(&group, rng));
    }

    arranged
        .into_iter()
        .enumerate()
        .map(|(index, question)| SequencedQuestion {
            question_order: index + 1,
            question,
        })
        .collect()
}
