//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod content_staging;
mod mention_handlers;
mod work_handlers;

pub use content_staging::ContentStaging;
pub use mention_handlers::*;
pub use work_handlers::*;
