//! Character Catalog Port - 出站端口
//!
//! 只读的人物名录：作品键 → {规范名 → [变体]}。
//! 显式构造并在启动时加载一次，可显式重新加载。

use async_trait::async_trait;
use thiserror::Error;

/// 名录错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// 名录中的一个人物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub variants: Vec<String>,
}

/// Character Catalog Port
#[async_trait]
pub trait CharacterCatalogPort: Send + Sync {
    /// 查找与源文件名匹配的作品的人物
    fn lookup(&self, filename: &str) -> Vec<CatalogEntry>;

    /// 重新读取名录，返回作品键的数量
    async fn reload(&self) -> Result<usize, CatalogError>;
}
