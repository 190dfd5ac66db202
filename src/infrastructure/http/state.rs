//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    // Command handlers
    BuildWorkHandler, DeleteWorkHandler, EnsureMentionsHandler,
    // Query handlers
    GetChapterContentHandler, GetCharacterMentionsHandler, GetNavigationHandler, GetWorkTreeHandler,
    ListCharactersHandler, ListWorksHandler, ReadChapterHandler,
    // Ports
    ChapterLockPort, CharacterCatalogPort, ContentStorePort, DocumentSourcePort,
    MentionRepositoryPort, WorkRepositoryPort,
};

/// 应用状态所需的端口
pub struct AppPorts {
    pub work_repo: Arc<dyn WorkRepositoryPort>,
    pub mention_repo: Arc<dyn MentionRepositoryPort>,
    pub content_store: Arc<dyn ContentStorePort>,
    pub document_source: Arc<dyn DocumentSourcePort>,
    pub catalog: Arc<dyn CharacterCatalogPort>,
    pub chapter_locks: Arc<dyn ChapterLockPort>,
}

/// 应用状态
pub struct AppState {
    // ========== Settings ==========
    /// 导入请求中的路径相对于此目录
    pub library_dir: PathBuf,

    // ========== Ports ==========
    pub catalog: Arc<dyn CharacterCatalogPort>,

    // ========== Command Handlers ==========
    pub build_work_handler: BuildWorkHandler,
    pub delete_work_handler: DeleteWorkHandler,
    pub ensure_mentions_handler: Arc<EnsureMentionsHandler>,

    // ========== Query Handlers ==========
    pub list_works_handler: ListWorksHandler,
    pub get_work_tree_handler: GetWorkTreeHandler,
    pub get_chapter_content_handler: GetChapterContentHandler,
    pub get_navigation_handler: GetNavigationHandler,
    pub read_chapter_handler: ReadChapterHandler,
    pub list_characters_handler: ListCharactersHandler,
    pub get_character_mentions_handler: GetCharacterMentionsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(ports: AppPorts, library_dir: PathBuf, retry_delay: Duration) -> Self {
        let AppPorts {
            work_repo,
            mention_repo,
            content_store,
            document_source,
            catalog,
            chapter_locks,
        } = ports;

        let ensure_mentions_handler = Arc::new(EnsureMentionsHandler::new(
            work_repo.clone(),
            mention_repo.clone(),
            chapter_locks,
            retry_delay,
        ));

        Self {
            library_dir,

            // Ports
            catalog: catalog.clone(),

            // Command handlers
            build_work_handler: BuildWorkHandler::new(
                work_repo.clone(),
                document_source,
                content_store.clone(),
                catalog,
            ),
            delete_work_handler: DeleteWorkHandler::new(work_repo.clone(), content_store.clone()),
            ensure_mentions_handler: ensure_mentions_handler.clone(),

            // Query handlers
            list_works_handler: ListWorksHandler::new(work_repo.clone()),
            get_work_tree_handler: GetWorkTreeHandler::new(work_repo.clone()),
            get_chapter_content_handler: GetChapterContentHandler::new(
                work_repo.clone(),
                content_store.clone(),
            ),
            get_navigation_handler: GetNavigationHandler::new(work_repo.clone()),
            read_chapter_handler: ReadChapterHandler::new(
                work_repo.clone(),
                content_store,
                ensure_mentions_handler,
            ),
            list_characters_handler: ListCharactersHandler::new(work_repo.clone()),
            get_character_mentions_handler: GetCharacterMentionsHandler::new(
                work_repo,
                mention_repo,
            ),
        }
    }
}
