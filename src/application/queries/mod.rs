//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod chapter_queries;
mod character_queries;
mod work_queries;

pub mod handlers;

pub use chapter_queries::*;
pub use character_queries::*;
pub use work_queries::*;
