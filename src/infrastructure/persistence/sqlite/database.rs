//! SQLite Database - 数据库连接、迁移和错误映射

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::application::ports::RepositoryError;
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/folio.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // 启用 WAL 模式，允许并发读写
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 设置 busy_timeout=5000ms，遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    // 外键约束保证父章节先于子章节写入
    sqlx::query("PRAGMA foreign_keys=ON")
        .execute(&pool)
        .await?;

    // 设置同步模式为 NORMAL（平衡性能和安全性）
    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!("SQLite pool created with WAL mode and busy_timeout=5000ms");

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 创建 works 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS works (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            filename TEXT NOT NULL UNIQUE,
            cover_ref TEXT,
            added_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 chapters 表（父节点先于子节点插入）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            id TEXT PRIMARY KEY,
            work_id TEXT NOT NULL,
            parent_id TEXT,
            element_type TEXT NOT NULL,
            number INTEGER NOT NULL,
            title TEXT NOT NULL,
            level INTEGER NOT NULL,
            position INTEGER NOT NULL,
            content_ref TEXT,
            is_branch INTEGER NOT NULL DEFAULT 0,
            is_processed INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (work_id) REFERENCES works(id) ON DELETE CASCADE,
            FOREIGN KEY (parent_id) REFERENCES chapters(id) ON DELETE CASCADE,
            UNIQUE (work_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 characters 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id TEXT PRIMARY KEY,
            work_id TEXT NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY (work_id) REFERENCES works(id) ON DELETE CASCADE,
            UNIQUE (work_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 name_variants 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS name_variants (
            character_id TEXT NOT NULL,
            ordinal INTEGER NOT NULL,
            variant TEXT NOT NULL,
            FOREIGN KEY (character_id) REFERENCES characters(id) ON DELETE CASCADE,
            PRIMARY KEY (character_id, ordinal)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 mentions 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mentions (
            id TEXT PRIMARY KEY,
            character_id TEXT NOT NULL,
            chapter_id TEXT NOT NULL,
            context TEXT,
            FOREIGN KEY (character_id) REFERENCES characters(id) ON DELETE CASCADE,
            FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建索引
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chapters_work_position
        ON chapters(work_id, position)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chapters_parent_id
        ON chapters(parent_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_characters_work_id
        ON characters(work_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_mentions_chapter_id
        ON mentions(chapter_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_mentions_character_id
        ON mentions(character_id)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// SQLITE_BUSY / SQLITE_LOCKED 及其扩展码
const BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// 把 sqlx 错误映射为仓储错误，区分唯一约束冲突和暂时性的锁冲突
pub fn map_db_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(db.message().to_string())
        }
        sqlx::Error::Database(db)
            if db.code().is_some_and(|code| BUSY_CODES.iter().any(|c| *c == code))
                || db.message().contains("database is locked") =>
        {
            RepositoryError::Busy(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut => RepositoryError::Busy(e.to_string()),
        _ => RepositoryError::DatabaseError(e.to_string()),
    }
}

/// 解析以文本存储的 UUID
pub(crate) fn parse_uuid(value: &str) -> Result<uuid::Uuid, RepositoryError> {
    uuid::Uuid::parse_str(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_db() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 迁移可重复执行
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let insert = "INSERT INTO works (id, title, author, filename, added_at) VALUES (?, 't', 'a', 'same.epub', '2024-01-01T00:00:00Z')";
        sqlx::query(insert).bind("a").execute(&pool).await.unwrap();
        let err = sqlx::query(insert).bind("b").execute(&pool).await.unwrap_err();

        assert!(matches!(map_db_error(err), RepositoryError::Duplicate(_)));
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(map_db_error(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!map_db_error(sqlx::Error::RowNotFound).is_transient());
    }
}
