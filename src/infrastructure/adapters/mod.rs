//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod catalog;
pub mod epub;
pub mod storage;

pub use catalog::*;
pub use epub::*;
pub use storage::*;
