//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod mention_repo;
mod work_repo;

pub use database::*;
pub use mention_repo::*;
pub use work_repo::*;
