//! Test Doubles - 应用层测试替身
//!
//! 内存内容存储、固定文档源、静态名录，以及基于内存 SQLite 的仓储

use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{
    CatalogEntry, CatalogError, ChapterRecord, CharacterCatalogPort, CharacterRecord,
    ContentError, ContentStorePort, DocumentError, DocumentSourcePort, MentionRepositoryPort,
    SourceDocument, WorkImport, WorkRecord, WorkRepositoryPort,
};
use crate::domain::work::ElementType;
use crate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteMentionRepository, SqliteWorkRepository,
};

// ============================================================================
// Content store
// ============================================================================

#[derive(Default)]
pub struct MemoryContentStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryContentStore {
    fn check(content_ref: &str) -> Result<(), ContentError> {
        let escapes = Path::new(content_ref)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || content_ref.is_empty() {
            return Err(ContentError::PathEscape(content_ref.to_string()));
        }
        Ok(())
    }

    pub fn contains(&self, content_ref: &str) -> bool {
        self.files.lock().unwrap().contains_key(content_ref)
    }

    pub fn get(&self, content_ref: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(content_ref)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    pub fn insert(&self, content_ref: &str, markup: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(content_ref.to_string(), markup.as_bytes().to_vec());
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStorePort for MemoryContentStore {
    async fn write(&self, content_ref: &str, markup: &str) -> Result<(), ContentError> {
        self.write_bytes(content_ref, markup.as_bytes()).await
    }

    async fn write_bytes(&self, content_ref: &str, data: &[u8]) -> Result<(), ContentError> {
        Self::check(content_ref)?;
        self.files
            .lock()
            .unwrap()
            .insert(content_ref.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, content_ref: &str) -> Result<String, ContentError> {
        Self::check(content_ref)?;
        self.get(content_ref)
            .ok_or_else(|| ContentError::NotFound(content_ref.to_string()))
    }

    async fn exists(&self, content_ref: &str) -> Result<bool, ContentError> {
        Self::check(content_ref)?;
        Ok(self.contains(content_ref))
    }

    async fn remove(&self, content_ref: &str) -> Result<(), ContentError> {
        self.files.lock().unwrap().remove(content_ref);
        Ok(())
    }

    async fn prune_dir(&self, dir_ref: &str) -> Result<(), ContentError> {
        Self::check(dir_ref)
    }
}

// ============================================================================
// Document source
// ============================================================================

pub struct FakeDocumentSource {
    document: SourceDocument,
    opened: AtomicUsize,
    fail: AtomicBool,
}

impl FakeDocumentSource {
    pub fn new(document: SourceDocument) -> Self {
        Self {
            document,
            opened: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// 下一次 open 返回错误
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentSourcePort for FakeDocumentSource {
    async fn open(&self, path: &Path) -> Result<SourceDocument, DocumentError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(DocumentError::OpenFailed {
                path: path.to_path_buf(),
                reason: "not a zip archive".to_string(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.document.clone())
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct StaticCatalog {
    entries: HashMap<String, Vec<CatalogEntry>>,
}

impl StaticCatalog {
    pub fn new(works: Vec<(&str, Vec<(&str, Vec<&str>)>)>) -> Self {
        let entries = works
            .into_iter()
            .map(|(filename, characters)| {
                let characters = characters
                    .into_iter()
                    .map(|(name, variants)| CatalogEntry {
                        name: name.to_string(),
                        variants: variants.into_iter().map(str::to_string).collect(),
                    })
                    .collect();
                (filename.to_string(), characters)
            })
            .collect();
        Self { entries }
    }
}

#[async_trait]
impl CharacterCatalogPort for StaticCatalog {
    fn lookup(&self, filename: &str) -> Vec<CatalogEntry> {
        self.entries.get(filename).cloned().unwrap_or_default()
    }

    async fn reload(&self) -> Result<usize, CatalogError> {
        Ok(self.entries.len())
    }
}

// ============================================================================
// Repositories
// ============================================================================

/// 内存 SQLite 上的两个仓储（共享同一连接池）
pub async fn memory_repositories() -> (Arc<dyn WorkRepositoryPort>, Arc<dyn MentionRepositoryPort>)
{
    let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    (
        Arc::new(SqliteWorkRepository::new(pool.clone())),
        Arc::new(SqliteMentionRepository::new(pool)),
    )
}

/// 预置作品的 ID
pub struct SeededWork {
    pub work_id: Uuid,
    /// "Часть I"，与第一章共享正文
    pub section_chapter_id: Uuid,
    /// "Глава 1"
    pub leaf_chapter_id: Uuid,
    /// "Глава 2"
    pub second_chapter_id: Uuid,
    pub character_ids: Vec<Uuid>,
}

pub const SEEDED_FIRST_REF: &str = "seeded/glava_1.html";
pub const SEEDED_SECOND_REF: &str = "seeded/glava_2.html";

/// 写入一部两章的作品："Часть I" → "Глава 1", "Глава 2"
pub async fn seed_work(repo: &dyn WorkRepositoryPort, character_names: &[&str]) -> SeededWork {
    let work_id = Uuid::new_v4();
    let section_id = Uuid::new_v4();
    let first_id = Uuid::new_v4();
    let second_id = Uuid::new_v4();

    let chapter = |id, parent_id, element_type, number, title: &str, level, position, content_ref: &str, is_branch| {
        ChapterRecord {
            id,
            work_id,
            parent_id,
            element_type,
            number,
            title: title.to_string(),
            level,
            position,
            content_ref: Some(content_ref.to_string()),
            is_branch,
            is_processed: false,
        }
    };

    let characters: Vec<CharacterRecord> = character_names
        .iter()
        .map(|name| CharacterRecord {
            id: Uuid::new_v4(),
            work_id,
            name: name.to_string(),
            variants: Vec::new(),
        })
        .collect();

    let import = WorkImport {
        work: WorkRecord {
            id: work_id,
            title: "Герой нашего времени".to_string(),
            author: "Лермонтов".to_string(),
            filename: format!("seeded-{work_id}.epub"),
            cover_ref: None,
            added_at: Utc::now(),
        },
        chapters: vec![
            chapter(section_id, None, ElementType::Part, 1, "Часть I", 0, 0, SEEDED_FIRST_REF, true),
            chapter(first_id, Some(section_id), ElementType::Chapter, 1, "Глава 1", 1, 1, SEEDED_FIRST_REF, false),
            chapter(second_id, Some(section_id), ElementType::Chapter, 2, "Глава 2", 1, 2, SEEDED_SECOND_REF, false),
        ],
        characters: characters.clone(),
    };
    repo.save_import(&import).await.unwrap();

    SeededWork {
        work_id,
        section_chapter_id: section_id,
        leaf_chapter_id: first_id,
        second_chapter_id: second_id,
        character_ids: characters.iter().map(|c| c.id).collect(),
    }
}
