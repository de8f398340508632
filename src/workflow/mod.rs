//! 流程层（Workflow Layer）
//!
//! 定义"一次试验"从分配版本号到写完全部顺序行的流程

pub mod version_ctx;
pub mod version_flow;

pub use version_ctx::VersionCtx;
pub use version_flow::{ProcessResult, VersionFlow};
