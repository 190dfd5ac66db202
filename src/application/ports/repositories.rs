//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::character::Character;
use crate::domain::work::ElementType;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// 数据库暂时被锁（SQLITE_BUSY / SQLITE_LOCKED）
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl RepositoryError {
    /// 稍后重试可能成功的错误
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Busy(_))
    }
}

// ============================================================================
// Work Repository
// ============================================================================

/// 作品实体（用于持久化）
#[derive(Debug, Clone)]
pub struct WorkRecord {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// 源文件名，全局唯一
    pub filename: String,
    pub cover_ref: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// 章节实体
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub work_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub element_type: ElementType,
    pub number: u32,
    pub title: String,
    /// 目录深度
    pub level: u32,
    /// 深度优先阅读顺序中的位置
    pub position: u32,
    pub content_ref: Option<String>,
    pub is_branch: bool,
    /// 是否已做过人物提及检测
    pub is_processed: bool,
}

/// 人物实体
#[derive(Debug, Clone)]
pub struct CharacterRecord {
    pub id: Uuid,
    pub work_id: Uuid,
    pub name: String,
    pub variants: Vec<String>,
}

impl CharacterRecord {
    pub fn to_character(&self) -> Character {
        Character::from_parts(self.id, self.work_id, self.name.clone(), self.variants.clone())
    }
}

impl From<&Character> for CharacterRecord {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id(),
            work_id: character.work_id(),
            name: character.name().to_string(),
            variants: character.variants().to_vec(),
        }
    }
}

/// 一次导入的全部结构数据，在一个事务中写入
#[derive(Debug, Clone)]
pub struct WorkImport {
    pub work: WorkRecord,
    /// 父节点总是排在子节点之前
    pub chapters: Vec<ChapterRecord>,
    pub characters: Vec<CharacterRecord>,
}

/// Work Repository Port
#[async_trait]
pub trait WorkRepositoryPort: Send + Sync {
    /// 原子地保存作品、章节和人物
    ///
    /// 文件名已存在时返回 `RepositoryError::Duplicate`，不写入任何数据
    async fn save_import(&self, import: &WorkImport) -> Result<(), RepositoryError>;

    /// 根据 ID 查找作品
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkRecord>, RepositoryError>;

    /// 根据源文件名查找作品
    async fn find_by_filename(&self, filename: &str) -> Result<Option<WorkRecord>, RepositoryError>;

    /// 获取所有作品
    async fn find_all(&self) -> Result<Vec<WorkRecord>, RepositoryError>;

    /// 删除作品（级联删除章节、人物和提及）
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 作品的全部章节，按阅读顺序
    async fn find_chapters(&self, work_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError>;

    /// 根据 ID 查找章节
    async fn find_chapter(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 作品的全部人物
    async fn find_characters(&self, work_id: Uuid)
        -> Result<Vec<CharacterRecord>, RepositoryError>;

    /// 根据 ID 查找人物
    async fn find_character(&self, id: Uuid) -> Result<Option<CharacterRecord>, RepositoryError>;
}

// ============================================================================
// Mention Repository
// ============================================================================

/// 人物提及实体
#[derive(Debug, Clone)]
pub struct MentionRecord {
    pub id: Uuid,
    pub character_id: Uuid,
    pub chapter_id: Uuid,
    pub context: Option<String>,
}

/// 带章节信息的提及
#[derive(Debug, Clone)]
pub struct ChapterMention {
    pub mention_id: Uuid,
    pub chapter_id: Uuid,
    pub chapter_title: String,
    pub chapter_position: u32,
    pub context: Option<String>,
}

/// Mention Repository Port
#[async_trait]
pub trait MentionRepositoryPort: Send + Sync {
    /// 在一个事务中删除章节的旧提及、写入新提及并把章节标记为已处理
    async fn replace_for_chapter(
        &self,
        chapter_id: Uuid,
        mentions: &[MentionRecord],
    ) -> Result<(), RepositoryError>;

    /// 章节内的全部提及
    async fn find_by_chapter(&self, chapter_id: Uuid) -> Result<Vec<MentionRecord>, RepositoryError>;

    /// 人物的提及，可限定在阅读位置 `up_to_position`（含）之前的章节
    async fn find_by_character(
        &self,
        character_id: Uuid,
        up_to_position: Option<u32>,
    ) -> Result<Vec<ChapterMention>, RepositoryError>;
}
