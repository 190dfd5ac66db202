//! SQLite Work Repository
//!
//! 作品、章节树与人物的持久化；一次导入在单个事务中写入

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, parse_uuid, DbPool};
use crate::application::ports::{
    ChapterRecord, CharacterRecord, RepositoryError, WorkImport, WorkRecord, WorkRepositoryPort,
};
use crate::domain::work::ElementType;

/// SQLite Work Repository
pub struct SqliteWorkRepository {
    pool: DbPool,
}

impl SqliteWorkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const WORK_COLUMNS: &str = "id, title, author, filename, cover_ref, added_at";

const CHAPTER_COLUMNS: &str = "id, work_id, parent_id, element_type, number, title, level, \
                               position, content_ref, is_branch, is_processed";

#[derive(FromRow)]
struct WorkRow {
    id: String,
    title: String,
    author: String,
    filename: String,
    cover_ref: Option<String>,
    added_at: String,
}

impl TryFrom<WorkRow> for WorkRecord {
    type Error = RepositoryError;

    fn try_from(row: WorkRow) -> Result<Self, Self::Error> {
        Ok(WorkRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            author: row.author,
            filename: row.filename,
            cover_ref: row.cover_ref,
            added_at: DateTime::parse_from_rfc3339(&row.added_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    work_id: String,
    parent_id: Option<String>,
    element_type: String,
    number: i64,
    title: String,
    level: i64,
    position: i64,
    content_ref: Option<String>,
    is_branch: bool,
    is_processed: bool,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: parse_uuid(&row.id)?,
            work_id: parse_uuid(&row.work_id)?,
            parent_id: row.parent_id.as_deref().map(parse_uuid).transpose()?,
            element_type: ElementType::from_str(&row.element_type).unwrap_or_default(),
            number: row.number as u32,
            title: row.title,
            level: row.level as u32,
            position: row.position as u32,
            content_ref: row.content_ref,
            is_branch: row.is_branch,
            is_processed: row.is_processed,
        })
    }
}

#[derive(FromRow)]
struct CharacterRow {
    id: String,
    work_id: String,
    name: String,
}

#[derive(FromRow)]
struct VariantRow {
    character_id: String,
    variant: String,
}

impl SqliteWorkRepository {
    /// 为人物行补上按序排列的名称变体
    async fn attach_variants(
        &self,
        rows: Vec<CharacterRow>,
    ) -> Result<Vec<CharacterRecord>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; rows.len()].join(", ");
        let sql = format!(
            "SELECT character_id, variant FROM name_variants WHERE character_id IN ({placeholders}) ORDER BY character_id, ordinal"
        );
        let mut query = sqlx::query_as::<_, VariantRow>(&sql);
        for row in &rows {
            query = query.bind(&row.id);
        }
        let variant_rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        let mut variants: HashMap<String, Vec<String>> = HashMap::new();
        for row in variant_rows {
            variants.entry(row.character_id).or_default().push(row.variant);
        }

        rows.into_iter()
            .map(|row| {
                Ok(CharacterRecord {
                    id: parse_uuid(&row.id)?,
                    work_id: parse_uuid(&row.work_id)?,
                    variants: variants.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl WorkRepositoryPort for SqliteWorkRepository {
    async fn save_import(&self, import: &WorkImport) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let work = &import.work;
        sqlx::query(
            r#"
            INSERT INTO works (id, title, author, filename, cover_ref, added_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(work.id.to_string())
        .bind(&work.title)
        .bind(&work.author)
        .bind(&work.filename)
        .bind(&work.cover_ref)
        .bind(work.added_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        for chapter in &import.chapters {
            sqlx::query(
                r#"
                INSERT INTO chapters (id, work_id, parent_id, element_type, number, title, level,
                                      position, content_ref, is_branch, is_processed)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(chapter.id.to_string())
            .bind(chapter.work_id.to_string())
            .bind(chapter.parent_id.map(|id| id.to_string()))
            .bind(chapter.element_type.as_str())
            .bind(chapter.number as i64)
            .bind(&chapter.title)
            .bind(chapter.level as i64)
            .bind(chapter.position as i64)
            .bind(&chapter.content_ref)
            .bind(chapter.is_branch)
            .bind(chapter.is_processed)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        for character in &import.characters {
            sqlx::query("INSERT INTO characters (id, work_id, name) VALUES (?, ?, ?)")
                .bind(character.id.to_string())
                .bind(character.work_id.to_string())
                .bind(&character.name)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;

            for (ordinal, variant) in character.variants.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO name_variants (character_id, ordinal, variant) VALUES (?, ?, ?)",
                )
                .bind(character.id.to_string())
                .bind(ordinal as i64)
                .bind(variant)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
            }
        }

        tx.commit().await.map_err(map_db_error)?;

        tracing::debug!(
            work_id = %work.id,
            chapters = import.chapters.len(),
            characters = import.characters.len(),
            "Work import saved"
        );

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkRecord>, RepositoryError> {
        let row: Option<WorkRow> =
            sqlx::query_as(&format!("SELECT {WORK_COLUMNS} FROM works WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        row.map(WorkRecord::try_from).transpose()
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<WorkRecord>, RepositoryError> {
        let row: Option<WorkRow> =
            sqlx::query_as(&format!("SELECT {WORK_COLUMNS} FROM works WHERE filename = ?"))
                .bind(filename)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        row.map(WorkRecord::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<WorkRecord>, RepositoryError> {
        let rows: Vec<WorkRow> = sqlx::query_as(&format!(
            "SELECT {WORK_COLUMNS} FROM works ORDER BY added_at DESC, title"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(WorkRecord::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        // 使用事务确保原子性
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let work_id = id.to_string();

        // 删除关联的 mentions（通过 chapters）
        sqlx::query(
            "DELETE FROM mentions WHERE chapter_id IN (SELECT id FROM chapters WHERE work_id = ?)",
        )
        .bind(&work_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // 删除关联的 name_variants（通过 characters）
        sqlx::query(
            "DELETE FROM name_variants WHERE character_id IN (SELECT id FROM characters WHERE work_id = ?)",
        )
        .bind(&work_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query("DELETE FROM characters WHERE work_id = ?")
            .bind(&work_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query("DELETE FROM chapters WHERE work_id = ?")
            .bind(&work_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let result = sqlx::query("DELETE FROM works WHERE id = ?")
            .bind(&work_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("work {id}")));
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    async fn find_chapters(&self, work_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE work_id = ? ORDER BY position"
        ))
        .bind(work_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn find_chapter(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> =
            sqlx::query_as(&format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_characters(
        &self,
        work_id: Uuid,
    ) -> Result<Vec<CharacterRecord>, RepositoryError> {
        let rows: Vec<CharacterRow> =
            sqlx::query_as("SELECT id, work_id, name FROM characters WHERE work_id = ? ORDER BY name")
                .bind(work_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_error)?;

        self.attach_variants(rows).await
    }

    async fn find_character(&self, id: Uuid) -> Result<Option<CharacterRecord>, RepositoryError> {
        let row: Option<CharacterRow> =
            sqlx::query_as("SELECT id, work_id, name FROM characters WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        match row {
            Some(row) => Ok(self.attach_variants(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteWorkRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteWorkRepository::new(pool)
    }

    fn import(filename: &str) -> WorkImport {
        let work_id = Uuid::new_v4();
        let part_id = Uuid::new_v4();
        let chapter = |id, parent_id: Option<Uuid>, element_type, title: &str, position| ChapterRecord {
            id,
            work_id,
            parent_id,
            element_type,
            number: 1,
            title: title.to_string(),
            level: u32::from(parent_id.is_some()),
            position,
            content_ref: Some("w/c1.html".to_string()),
            is_branch: parent_id.is_none(),
            is_processed: false,
        };

        WorkImport {
            work: WorkRecord {
                id: work_id,
                title: "Бесы".to_string(),
                author: "Достоевский".to_string(),
                filename: filename.to_string(),
                cover_ref: Some("covers/cover_1.jpg".to_string()),
                added_at: Utc::now(),
            },
            chapters: vec![
                chapter(part_id, None, ElementType::Part, "Часть первая", 0),
                chapter(Uuid::new_v4(), Some(part_id), ElementType::Chapter, "Глава первая", 1),
            ],
            characters: vec![CharacterRecord {
                id: Uuid::new_v4(),
                work_id,
                name: "Николай Ставрогин".to_string(),
                variants: vec!["Николай Всеволодович".to_string(), "Ставрогин".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_save_and_load_import() {
        let repo = repo().await;
        let import = import("besy.epub");
        repo.save_import(&import).await.unwrap();

        let work = repo.find_by_filename("besy.epub").await.unwrap().unwrap();
        assert_eq!(work.id, import.work.id);
        assert_eq!(work.cover_ref.as_deref(), Some("covers/cover_1.jpg"));

        let chapters = repo.find_chapters(work.id).await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].element_type, ElementType::Part);
        assert_eq!(chapters[1].parent_id, Some(chapters[0].id));
        assert!(chapters[0].is_branch);

        let characters = repo.find_characters(work.id).await.unwrap();
        assert_eq!(
            characters[0].variants,
            vec!["Николай Всеволодович", "Ставрогин"]
        );
        let single = repo.find_character(characters[0].id).await.unwrap().unwrap();
        assert_eq!(single.variants.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_filename_writes_nothing() {
        let repo = repo().await;
        repo.save_import(&import("besy.epub")).await.unwrap();

        let second = import("besy.epub");
        let err = repo.save_import(&second).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Duplicate(_)));
        assert!(repo.find_chapters(second.work.id).await.unwrap().is_empty());
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_child_before_parent_is_rejected() {
        let repo = repo().await;
        let mut import = import("besy.epub");
        import.chapters.reverse();

        assert!(repo.save_import(&import).await.is_err());
        assert!(repo.find_by_filename("besy.epub").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let repo = repo().await;
        let import = import("besy.epub");
        repo.save_import(&import).await.unwrap();

        repo.delete(import.work.id).await.unwrap();

        assert!(repo.find_by_id(import.work.id).await.unwrap().is_none());
        assert!(repo.find_chapters(import.work.id).await.unwrap().is_empty());
        assert!(repo.find_characters(import.work.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(import.work.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
