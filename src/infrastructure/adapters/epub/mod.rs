//! EPUB Adapter - 基于 `epub` crate 的文档源

mod epub_source;

pub use epub_source::EpubDocumentSource;
