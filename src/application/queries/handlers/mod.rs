//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod chapter_handlers;
mod character_handlers;
mod work_handlers;

pub use chapter_handlers::*;
pub use character_handlers::*;
pub use work_handlers::*;
