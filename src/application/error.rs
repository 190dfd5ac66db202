//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{CatalogError, ContentError, DocumentError, RepositoryError};
use crate::domain::work::WorkError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 路径越界等安全问题
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 作品导入失败（已回滚）
    #[error("Ingestion of {filename} failed: {reason}")]
    Ingestion { filename: String, reason: String },

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建导入失败错误
    pub fn ingestion(filename: impl Into<String>, reason: impl ToString) -> Self {
        Self::Ingestion {
            filename: filename.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<ContentError> for ApplicationError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::PathEscape(path) => Self::SecurityViolation(path),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<DocumentError> for ApplicationError {
    fn from(err: DocumentError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(err: CatalogError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<WorkError> for ApplicationError {
    fn from(err: WorkError) -> Self {
        Self::BusinessRuleViolation(err.to_string())
    }
}
