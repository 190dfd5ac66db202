//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use adapters::{EpubDocumentSource, FileContentStore, JsonCharacterCatalog};
pub use memory::InMemoryChapterLocks;
pub use persistence::sqlite::{SqliteMentionRepository, SqliteWorkRepository};
pub use worker::{LibraryScanner, ScanSummary};
