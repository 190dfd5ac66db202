//! Background Workers
//!
//! 启动时的书库扫描

mod library_scanner;

pub use library_scanner::{LibraryScanner, ScanSummary};
