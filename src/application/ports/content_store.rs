//! Content Store Port - 出站端口
//!
//! 清洗后章节正文与封面的文件存储。
//! 所有引用都是相对内容根目录的路径，实现必须拒绝逃出根目录的路径。

use async_trait::async_trait;
use thiserror::Error;

/// 内容存储错误
#[derive(Debug, Error)]
pub enum ContentError {
    /// 解析后的路径不在内容根目录之下
    #[error("Security violation: path escapes content root: {0}")]
    PathEscape(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Content Store Port
#[async_trait]
pub trait ContentStorePort: Send + Sync {
    /// 写入文本内容（覆盖已有文件）
    async fn write(&self, content_ref: &str, markup: &str) -> Result<(), ContentError>;

    /// 写入二进制内容
    async fn write_bytes(&self, content_ref: &str, data: &[u8]) -> Result<(), ContentError>;

    /// 读取文本内容
    async fn read(&self, content_ref: &str) -> Result<String, ContentError>;

    /// 引用对应的文件是否存在
    async fn exists(&self, content_ref: &str) -> Result<bool, ContentError>;

    /// 删除单个文件（不存在时忽略）
    async fn remove(&self, content_ref: &str) -> Result<(), ContentError>;

    /// 目录为空时删除它（不存在或非空时忽略）
    async fn prune_dir(&self, dir_ref: &str) -> Result<(), ContentError>;
}
