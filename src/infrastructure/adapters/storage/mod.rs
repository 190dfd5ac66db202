//! Storage Adapter - 文件系统内容存储

mod file_content_store;

pub use file_content_store::FileContentStore;
