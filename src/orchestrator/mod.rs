//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量生成和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `version_processor` - 版本管理服务
//! - 批量生成：校验 → 并行打乱 → 串行落库
//! - 按测试串行化版本号分配
//! - 列表 / 预览 / 删除 / 答案键
//! - 题库缓存
//!
//! ### `batch_processor` - 命令行批量处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载题库文件（Vec<QuestionBank>）
//! - 导出版本与答案键，写入告警
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<QuestionBank>)
//!     ↓
//! version_processor (处理一个测试的一批版本)
//!     ↓
//! workflow::VersionFlow (持久化一次试验)
//!     ↓
//! services (能力层：打乱 / 答案键 / 预览 / warn)
//!     ↓
//! infrastructure (基础设施：VersionStore / TtlCache)
//! ```

pub mod batch_processor;
pub mod version_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunStats};
pub use version_processor::VersionService;
