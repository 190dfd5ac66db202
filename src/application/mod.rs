//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、DocumentSource、ContentStore、CharacterCatalog 等）
//! - commands: CQRS 命令及处理器（导入、删除、提及检测）
//! - queries: CQRS 查询及处理器（章节树、阅读、人物）
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    BuildWork,
    DeleteWork,
    EnsureMentions,
    // Handlers
    handlers::{
        BuildWorkHandler, BuildWorkResponse, DeleteWorkHandler, EnsureMentionsHandler,
        EnsureMentionsResponse,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Catalog
    CatalogEntry,
    CatalogError,
    CharacterCatalogPort,
    // Locks
    ChapterLease,
    ChapterLockPort,
    // Content
    ContentError,
    ContentStorePort,
    // Documents
    DocumentError,
    DocumentSourcePort,
    SourceDocument,
    // Repositories
    ChapterMention,
    ChapterRecord,
    CharacterRecord,
    MentionRecord,
    MentionRepositoryPort,
    RepositoryError,
    WorkImport,
    WorkRecord,
    WorkRepositoryPort,
};

pub use queries::{
    GetChapterContent,
    GetCharacterMentions,
    GetNavigation,
    GetWorkTree,
    ListCharacters,
    ListWorks,
    ReadChapter,
    RenderHighlighted,
    // Handlers
    handlers::{
        GetChapterContentHandler, GetCharacterMentionsHandler, GetNavigationHandler,
        GetWorkTreeHandler, ListCharactersHandler, ListWorksHandler, ReadChapterHandler,
        RenderHighlightedHandler,
        // Responses
        ChapterContentResponse, ChapterLink, ChapterTreeNode, CharacterMentionsResponse,
        CharacterResponse, MentionResponse, NavigationResponse, ReadChapterResponse,
        WorkResponse, WorkTreeResponse,
    },
};
