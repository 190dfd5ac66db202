//! Library Scanner - 书库扫描器
//!
//! 启动时递归扫描书库目录，逐个导入 `*.epub`。
//! 单个文件失败只记录日志，不中断扫描。

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::application::{BuildWork, BuildWorkHandler};

/// 扫描结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// 新导入的作品
    pub imported: usize,
    /// 已存在而跳过的作品
    pub existing: usize,
    pub failed: usize,
}

/// 书库扫描器
pub struct LibraryScanner {
    books_dir: PathBuf,
}

impl LibraryScanner {
    pub fn new(books_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
        }
    }

    /// 列出目录下所有 EPUB（按路径排序）
    pub async fn find_documents(&self) -> Vec<PathBuf> {
        let dir = self.books_dir.clone();
        match tokio::task::spawn_blocking(move || collect_epubs(&dir)).await {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!(error = %e, "Library walk task failed");
                Vec::new()
            }
        }
    }

    /// 导入所有找到的文档
    pub async fn scan(&self, handler: &BuildWorkHandler) -> ScanSummary {
        let documents = self.find_documents().await;
        tracing::info!(
            books_dir = %self.books_dir.display(),
            documents = documents.len(),
            "Library scan started"
        );

        let mut summary = ScanSummary::default();
        for path in documents {
            match handler.handle(BuildWork { path: path.clone() }).await {
                Ok(response) if response.created => summary.imported += 1,
                Ok(_) => summary.existing += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(path = %path.display(), error = %e, "Failed to import document");
                }
            }
        }

        tracing::info!(
            imported = summary.imported,
            existing = summary.existing,
            failed = summary.failed,
            "Library scan finished"
        );

        summary
    }
}

fn collect_epubs(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable library entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
        })
        .collect();

    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::application::ports::{DocumentMetadata, SpineDocument};
    use crate::application::testing::{
        memory_repositories, FakeDocumentSource, MemoryContentStore, StaticCatalog,
    };
    use crate::application::SourceDocument;

    fn library() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("russian/classics")).unwrap();
        for name in [
            "besy.epub",
            "russian/classics/geroi.EPUB",
            "russian/notes.txt",
            "russian/cover.jpg",
        ] {
            std::fs::write(dir.path().join(name), b"stub").unwrap();
        }
        dir
    }

    fn document() -> SourceDocument {
        SourceDocument {
            metadata: DocumentMetadata {
                title: Some("Повесть".to_string()),
                author: None,
            },
            outline: vec![],
            spine: vec![SpineDocument {
                id: "c1".to_string(),
                locator: "OEBPS/c1.xhtml".to_string(),
                markup: "<html><body><h1>Глава 1</h1><p>Текст.</p></body></html>".to_string(),
            }],
            cover: None,
        }
    }

    async fn handler(source: Arc<FakeDocumentSource>) -> BuildWorkHandler {
        let (work_repo, _) = memory_repositories().await;
        BuildWorkHandler::new(
            work_repo,
            source,
            Arc::new(MemoryContentStore::default()),
            Arc::new(StaticCatalog::new(vec![])),
        )
    }

    #[tokio::test]
    async fn test_find_documents_recurses_and_filters() {
        let dir = library();
        let found = LibraryScanner::new(dir.path()).find_documents().await;

        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["besy.epub", "russian/classics/geroi.EPUB"]);
    }

    #[tokio::test]
    async fn test_missing_dir_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let found = LibraryScanner::new(dir.path().join("absent")).find_documents().await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let dir = library();
        let scanner = LibraryScanner::new(dir.path());
        let handler = handler(Arc::new(FakeDocumentSource::new(document()))).await;

        let first = scanner.scan(&handler).await;
        assert_eq!(
            first,
            ScanSummary {
                imported: 2,
                existing: 0,
                failed: 0
            }
        );

        let second = scanner.scan(&handler).await;
        assert_eq!(second.imported, 0);
        assert_eq!(second.existing, 2);
    }

    #[tokio::test]
    async fn test_scan_continues_after_failure() {
        let dir = library();
        let source = Arc::new(FakeDocumentSource::new(document()));
        source.fail_next();
        let handler = handler(source.clone()).await;

        let summary = LibraryScanner::new(dir.path()).scan(&handler).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.imported, 1);
        assert_eq!(source.open_count(), 1);
    }
}
