//! Work Context - Errors

use thiserror::Error;

use super::NodeIndex;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("父节点不存在: {0}")]
    ParentNotFound(NodeIndex),

    #[error("节点不存在: {0}")]
    NodeNotFound(NodeIndex),

    #[error("标题不能为空")]
    EmptyTitle,

    #[error("目录为空，且阅读顺序中没有可用文档")]
    EmptyDocument,
}
