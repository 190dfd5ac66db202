//! Chapter Query Handlers
//!
//! 正文读取、阅读导航，以及阅读时的惰性提及检测与高亮

use std::sync::Arc;

use uuid::Uuid;

use crate::application::commands::handlers::EnsureMentionsHandler;
use crate::application::commands::EnsureMentions;
use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterRecord, ContentError, ContentStorePort, WorkRepositoryPort};
use crate::application::queries::{GetChapterContent, GetNavigation, ReadChapter, RenderHighlighted};
use crate::domain::character::{compile_all, render_highlighted, Character};

// ============================================================================
// Response DTOs
// ============================================================================

/// 导航中的一个章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLink {
    pub id: Uuid,
    pub title: String,
}

impl From<&ChapterRecord> for ChapterLink {
    fn from(record: &ChapterRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
        }
    }
}

/// 前后章节
#[derive(Debug, Clone, Default)]
pub struct NavigationResponse {
    pub prev: Option<ChapterLink>,
    pub next: Option<ChapterLink>,
}

/// 章节正文
#[derive(Debug, Clone)]
pub struct ChapterContentResponse {
    pub chapter_id: Uuid,
    pub work_id: Uuid,
    pub title: String,
    pub markup: String,
}

/// 阅读视图
#[derive(Debug, Clone)]
pub struct ReadChapterResponse {
    pub chapter_id: Uuid,
    pub work_id: Uuid,
    pub title: String,
    /// 带人物高亮的正文
    pub markup: String,
    pub navigation: NavigationResponse,
}

/// 阅读顺序中前后最近的、正文与当前章节不同的章节
pub fn navigation_for(chapters: &[ChapterRecord], chapter_id: Uuid) -> Option<NavigationResponse> {
    let index = chapters.iter().position(|c| c.id == chapter_id)?;
    let current = chapters[index].content_ref.as_deref();

    let readable = |c: &&ChapterRecord| {
        c.content_ref.is_some() && (current.is_none() || c.content_ref.as_deref() != current)
    };

    Some(NavigationResponse {
        prev: chapters[..index].iter().rev().find(readable).map(ChapterLink::from),
        next: chapters[index + 1..].iter().find(readable).map(ChapterLink::from),
    })
}

async fn load_chapter(
    work_repo: &dyn WorkRepositoryPort,
    chapter_id: Uuid,
) -> Result<ChapterRecord, ApplicationError> {
    work_repo
        .find_chapter(chapter_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))
}

async fn load_content(
    content_store: &dyn ContentStorePort,
    chapter: &ChapterRecord,
) -> Result<String, ApplicationError> {
    let content_ref = chapter
        .content_ref
        .as_deref()
        .ok_or_else(|| ApplicationError::not_found("Chapter content", chapter.id))?;

    match content_store.read(content_ref).await {
        Ok(markup) => Ok(markup),
        Err(ContentError::NotFound(_)) => {
            tracing::warn!(chapter_id = %chapter.id, content_ref = %content_ref, "Chapter content file missing");
            Err(ApplicationError::not_found("Chapter content", chapter.id))
        }
        Err(e) => Err(e.into()),
    }
}

async fn highlight(
    work_repo: &dyn WorkRepositoryPort,
    work_id: Uuid,
    markup: &str,
) -> Result<String, ApplicationError> {
    let characters: Vec<Character> = work_repo
        .find_characters(work_id)
        .await?
        .iter()
        .map(|record| record.to_character())
        .collect();
    if characters.is_empty() {
        return Ok(markup.to_string());
    }
    Ok(render_highlighted(markup, &compile_all(&characters)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GetChapterContent Handler
pub struct GetChapterContentHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    content_store: Arc<dyn ContentStorePort>,
}

impl GetChapterContentHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        content_store: Arc<dyn ContentStorePort>,
    ) -> Self {
        Self {
            work_repo,
            content_store,
        }
    }

    pub async fn handle(
        &self,
        query: GetChapterContent,
    ) -> Result<ChapterContentResponse, ApplicationError> {
        let chapter = load_chapter(self.work_repo.as_ref(), query.chapter_id).await?;
        let markup = load_content(self.content_store.as_ref(), &chapter).await?;

        Ok(ChapterContentResponse {
            chapter_id: chapter.id,
            work_id: chapter.work_id,
            title: chapter.title,
            markup,
        })
    }
}

/// GetNavigation Handler
pub struct GetNavigationHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
}

impl GetNavigationHandler {
    pub fn new(work_repo: Arc<dyn WorkRepositoryPort>) -> Self {
        Self { work_repo }
    }

    pub async fn handle(&self, query: GetNavigation) -> Result<NavigationResponse, ApplicationError> {
        let chapter = load_chapter(self.work_repo.as_ref(), query.chapter_id).await?;
        let chapters = self.work_repo.find_chapters(chapter.work_id).await?;

        navigation_for(&chapters, chapter.id)
            .ok_or_else(|| ApplicationError::not_found("Chapter", chapter.id))
    }
}

/// RenderHighlighted Handler
pub struct RenderHighlightedHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
}

impl RenderHighlightedHandler {
    pub fn new(work_repo: Arc<dyn WorkRepositoryPort>) -> Self {
        Self { work_repo }
    }

    pub async fn handle(&self, query: RenderHighlighted) -> Result<String, ApplicationError> {
        highlight(self.work_repo.as_ref(), query.work_id, &query.markup).await
    }
}

/// ReadChapter Handler
pub struct ReadChapterHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    content_store: Arc<dyn ContentStorePort>,
    ensure_mentions: Arc<EnsureMentionsHandler>,
}

impl ReadChapterHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        content_store: Arc<dyn ContentStorePort>,
        ensure_mentions: Arc<EnsureMentionsHandler>,
    ) -> Self {
        Self {
            work_repo,
            content_store,
            ensure_mentions,
        }
    }

    pub async fn handle(&self, query: ReadChapter) -> Result<ReadChapterResponse, ApplicationError> {
        let chapter = load_chapter(self.work_repo.as_ref(), query.chapter_id).await?;
        let markup = load_content(self.content_store.as_ref(), &chapter).await?;

        if !chapter.is_processed {
            let command = EnsureMentions {
                chapter_id: chapter.id,
                markup: markup.clone(),
                force: false,
            };
            // 检测失败不影响阅读
            if let Err(e) = self.ensure_mentions.handle(command).await {
                tracing::warn!(chapter_id = %chapter.id, error = %e, "Mention detection failed");
            }
        }

        let highlighted = highlight(self.work_repo.as_ref(), chapter.work_id, &markup).await?;
        let chapters = self.work_repo.find_chapters(chapter.work_id).await?;
        let navigation = navigation_for(&chapters, chapter.id).unwrap_or_default();

        Ok(ReadChapterResponse {
            chapter_id: chapter.id,
            work_id: chapter.work_id,
            title: chapter.title,
            markup: highlighted,
            navigation,
        })
    }
}
