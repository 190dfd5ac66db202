//! SQLite Mention Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, parse_uuid, DbPool};
use crate::application::ports::{
    ChapterMention, MentionRecord, MentionRepositoryPort, RepositoryError,
};

/// SQLite Mention Repository
pub struct SqliteMentionRepository {
    pool: DbPool,
}

impl SqliteMentionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MentionRow {
    id: String,
    character_id: String,
    chapter_id: String,
    context: Option<String>,
}

impl TryFrom<MentionRow> for MentionRecord {
    type Error = RepositoryError;

    fn try_from(row: MentionRow) -> Result<Self, Self::Error> {
        Ok(MentionRecord {
            id: parse_uuid(&row.id)?,
            character_id: parse_uuid(&row.character_id)?,
            chapter_id: parse_uuid(&row.chapter_id)?,
            context: row.context,
        })
    }
}

#[derive(FromRow)]
struct ChapterMentionRow {
    id: String,
    chapter_id: String,
    chapter_title: String,
    chapter_position: i64,
    context: Option<String>,
}

impl TryFrom<ChapterMentionRow> for ChapterMention {
    type Error = RepositoryError;

    fn try_from(row: ChapterMentionRow) -> Result<Self, Self::Error> {
        Ok(ChapterMention {
            mention_id: parse_uuid(&row.id)?,
            chapter_id: parse_uuid(&row.chapter_id)?,
            chapter_title: row.chapter_title,
            chapter_position: row.chapter_position as u32,
            context: row.context,
        })
    }
}

#[async_trait]
impl MentionRepositoryPort for SqliteMentionRepository {
    async fn replace_for_chapter(
        &self,
        chapter_id: Uuid,
        mentions: &[MentionRecord],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let chapter = chapter_id.to_string();

        sqlx::query("DELETE FROM mentions WHERE chapter_id = ?")
            .bind(&chapter)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for mention in mentions {
            sqlx::query(
                "INSERT INTO mentions (id, character_id, chapter_id, context) VALUES (?, ?, ?, ?)",
            )
            .bind(mention.id.to_string())
            .bind(mention.character_id.to_string())
            .bind(&chapter)
            .bind(&mention.context)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        let result = sqlx::query("UPDATE chapters SET is_processed = 1 WHERE id = ?")
            .bind(&chapter)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("chapter {chapter_id}")));
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_chapter(&self, chapter_id: Uuid) -> Result<Vec<MentionRecord>, RepositoryError> {
        let rows: Vec<MentionRow> = sqlx::query_as(
            "SELECT id, character_id, chapter_id, context FROM mentions WHERE chapter_id = ? ORDER BY rowid",
        )
        .bind(chapter_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(MentionRecord::try_from).collect()
    }

    async fn find_by_character(
        &self,
        character_id: Uuid,
        up_to_position: Option<u32>,
    ) -> Result<Vec<ChapterMention>, RepositoryError> {
        let rows: Vec<ChapterMentionRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.chapter_id, c.title AS chapter_title, c.position AS chapter_position, m.context
            FROM mentions m
            JOIN chapters c ON c.id = m.chapter_id
            WHERE m.character_id = ? AND (? IS NULL OR c.position <= ?)
            ORDER BY c.position, m.rowid
            "#,
        )
        .bind(character_id.to_string())
        .bind(up_to_position.map(i64::from))
        .bind(up_to_position.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(ChapterMention::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::WorkRepositoryPort;
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
    async fn test_replace_never_accumulates() {
        let (work_repo, mention_repo) = memory_repositories().await;
        let seeded = seed_work(work_repo.as_ref(), &["Бэла"]).await;
        let bela = seeded.character_ids[0];
        let chapter = seeded.leaf_chapter_id;

        let batch = vec![mention(bela, chapter, "Бэла пела."), mention(bela, chapter, "Бэла ушла.")];
        mention_repo.replace_for_chapter(chapter, &batch).await.unwrap();
        mention_repo.replace_for_chapter(chapter, &batch[..1]).await.unwrap();

        let stored = mention_repo.find_by_chapter(chapter).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, batch[0].id);
        assert!(work_repo.find_chapter(chapter).await.unwrap().unwrap().is_processed);
    }

    #[tokio::test]
    async fn test_replace_for_unknown_chapter_rolls_back() {
        let (work_repo, mention_repo) = memory_repositories().await;
        seed_work(work_repo.as_ref(), &[]).await;

        let result = mention_repo.replace_for_chapter(Uuid::new_v4(), &[]).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_character_respects_position() {
        let (work_repo, mention_repo) = memory_repositories().await;
        let seeded = seed_work(work_repo.as_ref(), &["Бэла"]).await;
        let bela = seeded.character_ids[0];

        for chapter in [seeded.second_chapter_id, seeded.leaf_chapter_id] {
            mention_repo
                .replace_for_chapter(chapter, &[mention(bela, chapter, "…")])
                .await
                .unwrap();
        }

        let all = mention_repo.find_by_character(bela, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].chapter_id, seeded.leaf_chapter_id);
        assert!(all[0].chapter_position < all[1].chapter_position);

        let first_only = mention_repo.find_by_character(bela, Some(1)).await.unwrap();
        assert_eq!(first_only.len(), 1);
        assert_eq!(first_only[0].chapter_title, "Глава 1");
    }
}
