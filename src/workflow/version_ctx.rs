//! 版本处理上下文
//!
//! 封装"我正在为哪个测试生成第几次试验"这一信息

use std::fmt::Display;

use crate::models::TestId;

/// 版本处理上下文
#[derive(Debug, Clone)]
pub struct VersionCtx {
    /// 测试ID
    pub test_id: TestId,

    /// 本批次中的试验序号（从1开始，仅用于日志显示）
    pub trial_index: usize,

    /// 本批次的试验总数
    pub trial_total: usize,
}

impl VersionCtx {
    /// 创建新的版本上下文
    pub fn new(test_id: TestId, trial_index: usize, trial_total: usize) -> Self {
        Self {
            test_id,
            trial_index,
            trial_total,
        }
    }
}

impl Display for VersionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[测试 {} 试验 {}/{}]",
            self.test_id, self.trial_index, self.trial_total
        )
    }
}
