//! Work Command Handlers
//!
//! 导入流程: 目录扁平化 → 修正规则 → 章节树 → 正文清洗入库 → 分节链接 → 单事务持久化

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::ContentStaging;
use crate::application::commands::{BuildWork, DeleteWork};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRecord, CharacterCatalogPort, CharacterRecord, ContentError, ContentStorePort,
    DocumentSourcePort, RepositoryError, SourceDocument, WorkImport, WorkRecord,
    WorkRepositoryPort,
};
use crate::domain::character::Character;
use crate::domain::markup;
use crate::domain::work::toc::{clean_text, title_from_locator};
use crate::domain::work::{
    apply_corrections, build_from_spine, build_hierarchy, normalize_outline,
    resolve_section_links, NodeIndex, SpineEntry, WorkError, WorkTree,
};

const UNKNOWN_AUTHOR: &str = "Неизвестен";
const TITLE_PREFIX_CHARS: usize = 50;
const COVERS_DIR: &str = "covers";

/// 文件名中的安全片段：只保留字母数字、`_`、`.`、`-`
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// 作品在内容根目录下的目录名
pub fn work_dir_for(filename: &str) -> String {
    sanitize_component(file_stem(filename))
}

/// 正文文件名（不含扩展名）：标题前 50 个安全字符 + `_` + 文档 ID
pub fn content_file_stem(title: &str, document_id: &str) -> String {
    let safe: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-'))
        .take(TITLE_PREFIX_CHARS)
        .collect();
    let safe = match safe.trim() {
        "" => "untitled",
        trimmed => trimmed,
    };
    format!("{}_{}", safe, sanitize_component(document_id))
}

// ============================================================================
// BuildWork
// ============================================================================

/// 导入响应
#[derive(Debug, Clone)]
pub struct BuildWorkResponse {
    pub work_id: Uuid,
    pub title: String,
    pub chapter_count: usize,
    pub character_count: usize,
    /// false 表示该文件名早已导入
    pub created: bool,
}

/// BuildWork Handler
pub struct BuildWorkHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    document_source: Arc<dyn DocumentSourcePort>,
    content_store: Arc<dyn ContentStorePort>,
    catalog: Arc<dyn CharacterCatalogPort>,
}

impl BuildWorkHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        document_source: Arc<dyn DocumentSourcePort>,
        content_store: Arc<dyn ContentStorePort>,
        catalog: Arc<dyn CharacterCatalogPort>,
    ) -> Self {
        Self {
            work_repo,
            document_source,
            content_store,
            catalog,
        }
    }

    pub async fn handle(&self, command: BuildWork) -> Result<BuildWorkResponse, ApplicationError> {
        let filename = command
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ApplicationError::validation(format!(
                    "Invalid document path: {}",
                    command.path.display()
                ))
            })?;

        if let Some(existing) = self.work_repo.find_by_filename(&filename).await? {
            tracing::debug!(work_id = %existing.id, filename = %filename, "Work already imported");
            return self.existing_response(existing).await;
        }

        let document = self
            .document_source
            .open(&command.path)
            .await
            .map_err(|e| ApplicationError::ingestion(&filename, e))?;

        let title = document
            .metadata
            .title
            .as_deref()
            .map(clean_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file_stem(&filename).to_string());
        let author = document
            .metadata
            .author
            .as_deref()
            .map(clean_text)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let mut tree =
            build_tree(&title, &document).map_err(|e| ApplicationError::ingestion(&filename, e))?;

        let work_id = Uuid::new_v4();
        let mut staging = ContentStaging::new(self.content_store.clone());

        let stored = match self
            .store_contents(&mut tree, &document, &work_dir_for(&filename), &mut staging)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                staging.rollback().await;
                tracing::error!(filename = %filename, error = %e, "Content storage aborted, import rolled back");
                return Err(match e {
                    ContentError::PathEscape(_) => e.into(),
                    other => ApplicationError::ingestion(&filename, other),
                });
            }
        };
        let linked = resolve_section_links(&mut tree);
        let cover_ref = self.store_cover(&document, &mut staging).await;

        let characters: Vec<CharacterRecord> = self
            .catalog
            .lookup(&filename)
            .into_iter()
            .map(|entry| CharacterRecord::from(&Character::new(work_id, entry.name, entry.variants)))
            .collect();

        let import = WorkImport {
            work: WorkRecord {
                id: work_id,
                title: title.clone(),
                author,
                filename: filename.clone(),
                cover_ref,
                added_at: Utc::now(),
            },
            chapters: chapter_records(work_id, &tree),
            characters,
        };

        match self.work_repo.save_import(&import).await {
            Ok(()) => {
                staging.commit();
                tracing::info!(
                    work_id = %work_id,
                    title = %title,
                    filename = %filename,
                    chapters = import.chapters.len(),
                    stored_documents = stored,
                    linked_sections = linked,
                    characters = import.characters.len(),
                    "Work imported"
                );
                Ok(BuildWorkResponse {
                    work_id,
                    title,
                    chapter_count: import.chapters.len(),
                    character_count: import.characters.len(),
                    created: true,
                })
            }
            Err(RepositoryError::Duplicate(_)) => {
                // 并发导入同一文件，以已保存的为准
                staging.rollback().await;
                let existing = self
                    .work_repo
                    .find_by_filename(&filename)
                    .await?
                    .ok_or_else(|| {
                        ApplicationError::ingestion(&filename, "duplicate filename vanished")
                    })?;
                tracing::info!(work_id = %existing.id, filename = %filename, "Concurrent import resolved to stored work");
                self.existing_response(existing).await
            }
            Err(e) => {
                staging.rollback().await;
                tracing::error!(filename = %filename, error = %e, "Failed to persist work, import rolled back");
                Err(ApplicationError::ingestion(&filename, e))
            }
        }
    }

    async fn existing_response(
        &self,
        work: WorkRecord,
    ) -> Result<BuildWorkResponse, ApplicationError> {
        let chapter_count = self.work_repo.find_chapters(work.id).await?.len();
        let character_count = self.work_repo.find_characters(work.id).await?.len();
        Ok(BuildWorkResponse {
            work_id: work.id,
            title: work.title,
            chapter_count,
            character_count,
            created: false,
        })
    }

    /// 清洗并写入每个带定位的节点的正文，返回写入的文档数
    ///
    /// 单个文档缺失或写入失败只跳过该节点；路径越界直接中止。
    async fn store_contents(
        &self,
        tree: &mut WorkTree,
        document: &SourceDocument,
        work_dir: &str,
        staging: &mut ContentStaging,
    ) -> Result<usize, ContentError> {
        let targets: Vec<(NodeIndex, String, String)> = tree
            .nodes()
            .filter_map(|(index, node)| {
                node.locator()
                    .map(|locator| (index, node.title().to_string(), locator.to_string()))
            })
            .collect();

        let mut used = HashSet::new();
        let mut stored = 0;

        for (index, title, locator) in targets {
            let Some(source) = document.document(&locator) else {
                tracing::warn!(title = %title, locator = %locator, "Content document missing, node left without content");
                continue;
            };

            let content_ref = self
                .unique_ref(work_dir, &content_file_stem(&title, &source.id), &mut used)
                .await?;
            let cleaned = markup::sanitize(&source.markup);

            match staging.write(&content_ref, &cleaned).await {
                Ok(()) => {}
                Err(e @ ContentError::PathEscape(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(title = %title, content_ref = %content_ref, error = %e, "Failed to store chapter content");
                    continue;
                }
            }

            if let Some(node) = tree.get_mut(index) {
                node.set_content_ref(content_ref);
            }
            stored += 1;
        }

        Ok(stored)
    }

    /// 作品内唯一、且不覆盖已有文件的引用
    async fn unique_ref(
        &self,
        work_dir: &str,
        stem: &str,
        used: &mut HashSet<String>,
    ) -> Result<String, ContentError> {
        let mut candidate = format!("{work_dir}/{stem}.html");
        let mut suffix = 2;
        while used.contains(&candidate) || self.content_store.exists(&candidate).await? {
            candidate = format!("{work_dir}/{stem}_{suffix}.html");
            suffix += 1;
        }
        used.insert(candidate.clone());
        Ok(candidate)
    }

    async fn store_cover(
        &self,
        document: &SourceDocument,
        staging: &mut ContentStaging,
    ) -> Option<String> {
        let cover = document.cover.as_ref()?;
        let token = Uuid::new_v4().simple().to_string();
        let content_ref = format!("{COVERS_DIR}/cover_{}.{}", &token[..8], cover.extension());

        match staging.write_bytes(&content_ref, &cover.data).await {
            Ok(()) => Some(content_ref),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store cover image");
                None
            }
        }
    }
}

/// 目录可用时按目录建树，否则按阅读顺序建扁平结构
fn build_tree(title: &str, document: &SourceDocument) -> Result<WorkTree, WorkError> {
    let entries = apply_corrections(title, normalize_outline(&document.outline));

    if entries.iter().any(|e| e.locator.is_some()) {
        match build_hierarchy(&entries) {
            Ok(tree) if !tree.is_empty() => return Ok(tree),
            Ok(_) => tracing::warn!(title = %title, "Table of contents produced no nodes"),
            Err(e) => tracing::warn!(title = %title, error = %e, "Table of contents unusable"),
        }
    }

    tracing::info!(title = %title, documents = document.spine.len(), "Building structure from reading order");
    let spine: Vec<SpineEntry> = document
        .spine
        .iter()
        .map(|doc| SpineEntry {
            title: markup::first_heading(&doc.markup)
                .unwrap_or_else(|| title_from_locator(Some(&doc.locator))),
            locator: doc.locator.clone(),
        })
        .collect();
    build_from_spine(&spine)
}

/// 按创建顺序（父节点在前）生成章节记录
fn chapter_records(work_id: Uuid, tree: &WorkTree) -> Vec<ChapterRecord> {
    let positions: HashMap<NodeIndex, u32> = tree
        .reading_order()
        .into_iter()
        .enumerate()
        .map(|(position, index)| (index, position as u32))
        .collect();

    tree.nodes()
        .map(|(index, node)| ChapterRecord {
            id: node.id(),
            work_id,
            parent_id: node.parent().and_then(|p| tree.get(p)).map(|p| p.id()),
            element_type: node.element_type(),
            number: node.number(),
            title: node.title().to_string(),
            level: node.level() as u32,
            position: positions.get(&index).copied().unwrap_or_default(),
            content_ref: node.content_ref().map(str::to_string),
            is_branch: node.is_branch(),
            is_processed: false,
        })
        .collect()
}

// ============================================================================
// DeleteWork
// ============================================================================

/// DeleteWork Handler
pub struct DeleteWorkHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
    content_store: Arc<dyn ContentStorePort>,
}

impl DeleteWorkHandler {
    pub fn new(
        work_repo: Arc<dyn WorkRepositoryPort>,
        content_store: Arc<dyn ContentStorePort>,
    ) -> Self {
        Self {
            work_repo,
            content_store,
        }
    }

    pub async fn handle(&self, command: DeleteWork) -> Result<(), ApplicationError> {
        let work_id = command.work_id;

        let work = self
            .work_repo
            .find_by_id(work_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Work", work_id))?;

        let content_refs: HashSet<String> = self
            .work_repo
            .find_chapters(work_id)
            .await?
            .into_iter()
            .filter_map(|c| c.content_ref)
            .chain(work.cover_ref.clone())
            .collect();

        self.work_repo.delete(work_id).await?;

        // 数据已删除，文件清理失败只记录
        for content_ref in &content_refs {
            if let Err(e) = self.content_store.remove(content_ref).await {
                tracing::warn!(content_ref = %content_ref, error = %e, "Failed to remove content file");
            }
        }
        if let Err(e) = self.content_store.prune_dir(&work_dir_for(&work.filename)).await {
            tracing::warn!(work_id = %work_id, error = %e, "Failed to remove work directory");
        }

        tracing::info!(
            work_id = %work_id,
            title = %work.title,
            files = content_refs.len(),
            "Work deleted"
        );

        Ok(())
    }
}
