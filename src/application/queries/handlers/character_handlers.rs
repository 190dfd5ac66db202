//! Character Query Handlers

use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterMention, CharacterRecord, MentionRepositoryPort, WorkRepositoryPort,
};
use crate::application::queries::{GetCharacterMentions, ListCharacters};

// ============================================================================
// Response DTOs
// ============================================================================

/// 人物
#[derive(Debug, Clone)]
pub struct CharacterResponse {
    pub id: Uuid,
    pub work_id: Uuid,
    pub name: String,
    pub variants: Vec<String>,
}

impl From<CharacterRecord> for CharacterResponse {
    fn from(record: CharacterRecord) -> Self {
        Self {
            id: record.id,
            work_id: record.work_id,
            name: record.name,
            variants: record.variants,
        }
    }
}

/// 一条带章节信息的提及
#[derive(Debug, Clone)]
pub struct MentionResponse {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub chapter_title: String,
    pub context: Option<String>,
}

impl From<ChapterMention> for MentionResponse {
    fn from(mention: ChapterMention) -> Self {
        Self {
            id: mention.mention_id,
            chapter_id: mention.chapter_id,
            chapter_title: mention.chapter_title,
            context: mention.context,
        }
    }
}

/// 人物及其提及
#[derive(Debug, Clone)]
pub struct CharacterMentionsResponse {
    pub character: CharacterResponse,
    pub mentions: Vec<MentionResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListCharacters Handler
pub struct ListCharactersHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
}

impl ListCharactersHandler {
    pub fn new(work_repo: Arc<dyn WorkRepositoryPort>) -> Self {
        Self { work_repo }
    }

    pub async fn handle(
        &self,
        query: ListCharacters,
    ) -> Result<Vec<CharacterResponse>, ApplicationError> {
        if self.work_repo.find_by_id(query.work_id).await?.is_none() {
            return Err(ApplicationError::not_found("Work", query.work_id));
        }

        let characters = self.work_repo.find_characters(query.work_id).await?;
        Ok(characters.into_iter().map(CharacterResponse::from).collect())
    }
}

/// GetCharacterMentions Handler
///
/// 指定 `up_to_chapter` 时只返回阅读顺序中不晚于该章节的提及，避免剧透。
pub struct GetCharacterMentionsHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    mention_repo: Arc<dyn MentionRepositoryPort>,
}

impl GetCharacterMentionsHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        mention_repo: Arc<dyn MentionRepositoryPort>,
    ) -> Self {
        Self {
            work_repo,
            mention_repo,
        }
    }

    pub async fn handle(
        &self,
        query: GetCharacterMentions,
    ) -> Result<CharacterMentionsResponse, ApplicationError> {
        let character = self
            .work_repo
            .find_character(query.character_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Character", query.character_id))?;

        let up_to_position = match query.up_to_chapter {
            Some(chapter_id) => {
                let chapter = self
                    .work_repo
                    .find_chapter(chapter_id)
                    .await?
                    .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))?;
                if chapter.work_id != character.work_id {
                    return Err(ApplicationError::validation(format!(
                        "Chapter {} does not belong to the character's work",
                        chapter_id
                    )));
                }
                Some(chapter.position)
            }
            None => None,
        };

        let mentions = self
            .mention_repo
            .find_by_character(character.id, up_to_position)
            .await?;

        Ok(CharacterMentionsResponse {
            character: CharacterResponse::from(character),
            mentions: mentions.into_iter().map(MentionResponse::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MentionRecord;
    use crate::application::testing::{memory_repositories, seed_work};

    fn mention(character_id: Uuid, chapter_id: Uuid, context: &str) -> MentionRecord {
        MentionRecord {
            id: Uuid::new_v4(),
            character_id,
            chapter_id,
            context: Some(context.to_string()),
        }
    }

    #[tokio::test]
    async fn test_mentions_up_to_chapter() {
        let (work_repo, mention_repo) = memory_repositories().await;
        let seeded = seed_work(work_repo.as_ref(), &["Вера"]).await;
        let vera = seeded.character_ids[0];

        mention_repo
            .replace_for_chapter(seeded.leaf_chapter_id, &[mention(vera, seeded.leaf_chapter_id, "Вера пришла.")])
            .await
            .unwrap();
        mention_repo
            .replace_for_chapter(seeded.second_chapter_id, &[mention(vera, seeded.second_chapter_id, "Вера ушла.")])
            .await
            .unwrap();

        let handler = GetCharacterMentionsHandler::new(work_repo.clone(), mention_repo.clone());

        let all = handler
            .handle(GetCharacterMentions {
                character_id: vera,
                up_to_chapter: None,
            })
            .await
            .unwrap();
        assert_eq!(all.character.name, "Вера");
        assert_eq!(all.mentions.len(), 2);
        assert_eq!(all.mentions[0].chapter_title, "Глава 1");

        let so_far = handler
            .handle(GetCharacterMentions {
                character_id: vera,
                up_to_chapter: Some(seeded.leaf_chapter_id),
            })
            .await
            .unwrap();
        assert_eq!(so_far.mentions.len(), 1);
        assert_eq!(so_far.mentions[0].context.as_deref(), Some("Вера пришла."));
    }

    #[tokio::test]
    async fn test_mentions_reject_chapter_of_other_work() {
        let (work_repo, mention_repo) = memory_repositories().await;
        let first = seed_work(work_repo.as_ref(), &["Вера"]).await;
        let second = seed_work(work_repo.as_ref(), &[]).await;

        let result = GetCharacterMentionsHandler::new(work_repo, mention_repo)
            .handle(GetCharacterMentions {
                character_id: first.character_ids[0],
                up_to_chapter: Some(second.leaf_chapter_id),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_characters() {
        let (work_repo, _) = memory_repositories().await;
        let seeded = seed_work(work_repo.as_ref(), &["Вера", "Грушницкий"]).await;
        let handler = ListCharactersHandler::new(work_repo);

        let characters = handler
            .handle(ListCharacters {
                work_id: seeded.work_id,
            })
            .await
            .unwrap();
        let names: Vec<&str> = characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Вера", "Грушницкий"]);

        let missing = handler
            .handle(ListCharacters {
                work_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }
}
