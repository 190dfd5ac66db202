//! Mention Command Handlers
//!
//! 章节人物提及检测：按章节加锁，检测一次后标记已处理

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::application::commands::EnsureMentions;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterLockPort, MentionRecord, MentionRepositoryPort, WorkRepositoryPort,
};
use crate::domain::character::{clean_text_for_storage, compile_all, scan_mentions, Character};

/// 检测结果
#[derive(Debug, Clone)]
pub struct EnsureMentionsResponse {
    pub chapter_id: Uuid,
    pub mention_count: usize,
    /// 章节已处理，未重新检测
    pub skipped: bool,
}

/// EnsureMentions Handler
pub struct EnsureMentionsHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    mention_repo: Arc<dyn MentionRepositoryPort>,
    locks: Arc<dyn ChapterLockPort>,
    retry_delay: Duration,
}

impl EnsureMentionsHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        mention_repo: Arc<dyn MentionRepositoryPort>,
        locks: Arc<dyn ChapterLockPort>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            work_repo,
            mention_repo,
            locks,
            retry_delay,
        }
    }

    pub async fn handle(
        &self,
        command: EnsureMentions,
    ) -> Result<EnsureMentionsResponse, ApplicationError> {
        let chapter_id = command.chapter_id;
        let _lease = self.locks.acquire(chapter_id).await;

        // 持锁后再读取状态，等待期间可能已被其他请求处理
        let chapter = self
            .work_repo
            .find_chapter(chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))?;

        if chapter.is_processed && !command.force {
            return Ok(EnsureMentionsResponse {
                chapter_id,
                mention_count: 0,
                skipped: true,
            });
        }

        let characters: Vec<Character> = self
            .work_repo
            .find_characters(chapter.work_id)
            .await?
            .iter()
            .map(|record| record.to_character())
            .collect();
        let patterns = compile_all(&characters);

        let mentions: Vec<MentionRecord> = scan_mentions(&command.markup, &patterns)
            .into_iter()
            .filter_map(|candidate| {
                let context = clean_text_for_storage(&candidate.context);
                if context.is_empty() {
                    return None;
                }
                Some(MentionRecord {
                    id: Uuid::new_v4(),
                    character_id: candidate.character_id,
                    chapter_id,
                    context: Some(context),
                })
            })
            .collect();

        match self.mention_repo.replace_for_chapter(chapter_id, &mentions).await {
            Ok(()) => {}
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    chapter_id = %chapter_id,
                    error = %e,
                    retry_in_ms = self.retry_delay.as_millis() as u64,
                    "Database busy while saving mentions, retrying once"
                );
                tokio::time::sleep(self.retry_delay).await;
                self.mention_repo
                    .replace_for_chapter(chapter_id, &mentions)
                    .await?;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            chapter_id = %chapter_id,
            title = %chapter.title,
            characters = characters.len(),
            mentions = mentions.len(),
            forced = command.force,
            "Chapter mentions detected"
        );

        Ok(EnsureMentionsResponse {
            chapter_id,
            mention_count: mentions.len(),
            skipped: false,
        })
    }
}
