//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod mention_commands;
mod work_commands;

pub mod handlers;

pub use mention_commands::*;
pub use work_commands::*;
