//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chapter_lock;
mod character_catalog;
mod content_store;
mod document_source;
mod repositories;

pub use chapter_lock::{ChapterLease, ChapterLockPort};
pub use character_catalog::{CatalogEntry, CatalogError, CharacterCatalogPort};
pub use content_store::{ContentError, ContentStorePort};
pub use document_source::{
    strip_fragment, CoverImage, DocumentError, DocumentMetadata, DocumentSourcePort,
    SourceDocument, SpineDocument,
};
pub use repositories::{
    ChapterMention, ChapterRecord, CharacterRecord, MentionRecord, MentionRepositoryPort,
    RepositoryError, WorkImport, WorkRecord, WorkRepositoryPort,
};
