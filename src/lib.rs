//! # Exam Shuffle
//!
//! 为同一场测试生成多个随机化版本（题目顺序 + 选项顺序），并为每个版本重建答案键
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有数据资源，只暴露读写能力
//! - `VersionStore` - 持久化边界（题库读取、版本写入）
//! - `MemoryStore` - 进程内实现
//! - `TtlCache` - 注入时钟的过期缓存
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，全部是纯函数
//! - `permutation` - Fisher-Yates 打乱与抽样
//! - `choice_shuffler` / `question_shuffler` - 选项打乱、分部题目打乱
//! - `materializer` - 一次完整试验
//! - `answer_key` / `preview` - 答案键重建、版本预览
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次试验"的落库流程
//! - `VersionCtx` - 上下文封装（test_id + 试验序号）
//! - `VersionFlow` - 分配版本号 → 写题目顺序 → 写选项顺序 → 失败回滚
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/version_processor` - 版本管理服务，控制并发与版本号串行
//! - `orchestrator/batch_processor` - 命令行批量处理器，遍历题库目录
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{MemoryStore, VersionStore};
pub use models::{Question, QuestionBank};
pub use orchestrator::{App, RunStats, VersionService};
pub use workflow::{ProcessResult, VersionCtx, VersionFlow};
