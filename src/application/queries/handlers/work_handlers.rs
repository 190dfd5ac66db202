//! Work Query Handlers

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterRecord, WorkRecord, WorkRepositoryPort};
use crate::application::queries::{GetWorkTree, ListWorks};

// ============================================================================
// Response DTOs
// ============================================================================

/// 作品摘要
#[derive(Debug, Clone)]
pub struct WorkResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub filename: String,
    pub cover_ref: Option<String>,
    pub added_at: String,
}

impl From<WorkRecord> for WorkResponse {
    fn from(record: WorkRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            filename: record.filename,
            cover_ref: record.cover_ref,
            added_at: record.added_at.to_rfc3339(),
        }
    }
}

/// 章节树节点
#[derive(Debug, Clone)]
pub struct ChapterTreeNode {
    pub id: Uuid,
    pub title: String,
    pub element_type: String,
    /// 元素类型的俄文名称
    pub element_label: String,
    pub number: u32,
    /// 例如 "2.3"
    pub display_number: String,
    pub has_content: bool,
    pub is_processed: bool,
    pub children: Vec<ChapterTreeNode>,
}

/// 作品及其章节森林
#[derive(Debug, Clone)]
pub struct WorkTreeResponse {
    pub work: WorkResponse,
    pub chapters: Vec<ChapterTreeNode>,
}

/// 由按阅读顺序排列的章节记录组装森林
///
/// 阅读顺序中兄弟节点已按序号排列，这里只需按父节点分组。
pub fn assemble_forest(chapters: &[ChapterRecord]) -> Vec<ChapterTreeNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<&ChapterRecord>> = HashMap::new();
    for chapter in chapters {
        by_parent.entry(chapter.parent_id).or_default().push(chapter);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|c| (c.number, c.position));
    }

    build_level(&by_parent, None, "")
}

fn build_level(
    by_parent: &HashMap<Option<Uuid>, Vec<&ChapterRecord>>,
    parent: Option<Uuid>,
    prefix: &str,
) -> Vec<ChapterTreeNode> {
    let Some(siblings) = by_parent.get(&parent) else {
        return Vec::new();
    };

    siblings
        .iter()
        .map(|chapter| {
            let display_number = if prefix.is_empty() {
                chapter.number.to_string()
            } else {
                format!("{prefix}.{}", chapter.number)
            };
            ChapterTreeNode {
                id: chapter.id,
                title: chapter.title.clone(),
                element_type: chapter.element_type.as_str().to_string(),
                element_label: chapter.element_type.label().to_string(),
                number: chapter.number,
                children: build_level(by_parent, Some(chapter.id), &display_number),
                display_number,
                has_content: chapter.content_ref.is_some(),
                is_processed: chapter.is_processed,
            }
        })
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// ListWorks Handler
pub struct ListWorksHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
}

impl ListWorksHandler {
    pub fn new(work_repo: Arc<dyn WorkRepositoryPort>) -> Self {
        Self { work_repo }
    }

    pub async fn handle(&self, _query: ListWorks) -> Result<Vec<WorkResponse>, ApplicationError> {
        let works = self.work_repo.find_all().await?;
        Ok(works.into_iter().map(WorkResponse::from).collect())
    }
}

/// GetWorkTree Handler
pub struct GetWorkTreeHandler {
    work_repo: Arc<dyn WorkRepositoryPort>,
}

impl GetWorkTreeHandler {
    pub fn new(work_repo: Arc<dyn WorkRepositoryPort>) -> Self {
        Self { work_repo }
    }

    pub async fn handle(&self, query: GetWorkTree) -> Result<WorkTreeResponse, ApplicationError> {
        let work = self
            .work_repo
            .find_by_id(query.work_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Work", query.work_id))?;

        let chapters = self.work_repo.find_chapters(work.id).await?;

        Ok(WorkTreeResponse {
            work: WorkResponse::from(work),
            chapters: assemble_forest(&chapters),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{memory_repositories, seed_work};

    #[tokio::test]
    async fn test_work_tree_has_display_numbers() {
        let (work_repo, _) = memory_repositories().await;
        let seeded = seed_work(work_repo.as_ref(), &[]).await;

        let response = GetWorkTreeHandler::new(work_repo)
            .handle(GetWorkTree {
                work_id: seeded.work_id,
            })
            .await
            .unwrap();

        assert_eq!(response.work.title, "Герой нашего времени");
        assert_eq!(response.chapters.len(), 1);
        let part = &response.chapters[0];
        assert_eq!(part.element_label, "Часть");
        let numbers: Vec<&str> = part
            .children
            .iter()
            .map(|c| c.display_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["1.1", "1.2"]);
        assert!(part.children.iter().all(|c| c.has_content && !c.is_processed));
    }

    #[tokio::test]
    async fn test_work_tree_unknown_work() {
        let (work_repo, _) = memory_repositories().await;
        let result = GetWorkTreeHandler::new(work_repo)
            .handle(GetWorkTree {
                work_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_works() {
        let (work_repo, _) = memory_repositories().await;
        seed_work(work_repo.as_ref(), &[]).await;
        seed_work(work_repo.as_ref(), &[]).await;

        let works = ListWorksHandler::new(work_repo).handle(ListWorks).await.unwrap();
        assert_eq!(works.len(), 2);
        assert!(works.iter().all(|w| w.author == "Лермонтов"));
    }
}
