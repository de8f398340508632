//! 基础设施层
//!
//! 持有数据资源，只暴露读写能力，不认识打乱算法

pub mod cache;
pub mod memory_store;
pub mod version_store;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use memory_store::MemoryStore;
pub use version_store::VersionStore;
