//! Folio - 俄语小说阅读与人物追踪服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Work Context: 目录规范化、章节树、序号解析
//! - Character Context: 人名模式、提及扫描、高亮
//!
//! 应用层 (application/):
//! - Ports: DocumentSource, ContentStore, CharacterCatalog, ChapterLock, Repositories
//! - Commands: 导入 / 删除作品，章节提及检测
//! - Queries: 章节树、阅读、人物与提及
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API
//! - Adapters: EPUB 解析、文件内容存储、JSON 人物名录
//! - Persistence: SQLite
//! - Memory: 章节锁表
//! - Worker: 启动时书库扫描

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
