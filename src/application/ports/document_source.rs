//! Document Source Port - 出站端口
//!
//! 打开电子书容器，提供元数据、嵌套目录、阅读顺序文档和封面

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::work::OutlineEntry;

/// 文档源错误
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Cannot open document {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Unsupported document: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 清单中的元数据
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// 阅读顺序中的一个内容文档
#[derive(Debug, Clone)]
pub struct SpineDocument {
    pub id: String,
    /// 容器内路径，与目录中的定位使用同一形式
    pub locator: String,
    pub markup: String,
}

/// 封面图片
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub data: Vec<u8>,
    pub mime: String,
}

impl CoverImage {
    /// 根据 MIME 类型推断扩展名
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "jpg",
        }
    }
}

/// 已读入内存的电子书
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    pub metadata: DocumentMetadata,
    pub outline: Vec<OutlineEntry>,
    pub spine: Vec<SpineDocument>,
    pub cover: Option<CoverImage>,
}

impl SourceDocument {
    /// 按定位查找内容文档，忽略 `#fragment`
    ///
    /// 先按完整路径匹配，再按路径后缀匹配（目录中的相对路径）。
    pub fn document(&self, locator: &str) -> Option<&SpineDocument> {
        let path = strip_fragment(locator);
        if path.is_empty() {
            return None;
        }

        self.spine
            .iter()
            .find(|doc| doc.locator == path)
            .or_else(|| {
                self.spine.iter().find(|doc| {
                    Path::new(&doc.locator).ends_with(path) || Path::new(path).ends_with(&doc.locator)
                })
            })
    }
}

/// 去掉定位中的 `#fragment`
pub fn strip_fragment(locator: &str) -> &str {
    locator.split('#').next().unwrap_or(locator).trim()
}

/// Document Source Port
#[async_trait]
pub trait DocumentSourcePort: Send + Sync {
    /// 打开并完整读入一个电子书文件
    async fn open(&self, path: &Path) -> Result<SourceDocument, DocumentError>;
}
