//! EPUB Document Source
//!
//! 实现 DocumentSourcePort：一次性读入清单元数据、嵌套目录、
//! 阅读顺序中的全部文档和封面。解析是阻塞操作，放在 `spawn_blocking` 中执行。

use async_trait::async_trait;
use epub::doc::{EpubDoc, NavPoint};
use std::io::{Read, Seek};
use std::path::Path;

use crate::application::ports::{
    CoverImage, DocumentError, DocumentMetadata, DocumentSourcePort, SourceDocument,
    SpineDocument,
};
use crate::domain::work::OutlineEntry;

/// EPUB 文档源
#[derive(Debug, Default, Clone, Copy)]
pub struct EpubDocumentSource;

impl EpubDocumentSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentSourcePort for EpubDocumentSource {
    async fn open(&self, path: &Path) -> Result<SourceDocument, DocumentError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_document(&path))
            .await
            .map_err(|e| DocumentError::IoError(format!("EPUB parser task failed: {e}")))?
    }
}

fn read_document(path: &Path) -> Result<SourceDocument, DocumentError> {
    let mut doc = EpubDoc::new(path).map_err(|e| DocumentError::OpenFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let metadata = DocumentMetadata {
        title: doc.mdata("title").map(|m| m.value.clone()),
        author: doc.mdata("creator").map(|m| m.value.clone()),
    };
    let outline = doc.toc.iter().map(outline_entry).collect::<Vec<_>>();
    let spine = read_spine(&mut doc);

    if spine.is_empty() {
        return Err(DocumentError::Unsupported(format!(
            "{} has no readable content documents",
            path.display()
        )));
    }

    let cover = doc.get_cover().map(|(data, mime)| CoverImage { data, mime });

    tracing::debug!(
        path = %path.display(),
        toc_entries = outline.len(),
        documents = spine.len(),
        has_cover = cover.is_some(),
        "EPUB loaded"
    );

    Ok(SourceDocument {
        metadata,
        outline,
        spine,
        cover,
    })
}

fn outline_entry(point: &NavPoint) -> OutlineEntry {
    let locator = point.content.to_string_lossy().replace('\\', "/");
    let locator = Some(locator.as_str()).filter(|l| !l.is_empty());
    OutlineEntry::new(point.label.clone(), locator)
        .with_children(point.children.iter().map(outline_entry).collect())
}

/// 按阅读顺序读出所有文本文档，跳过读取失败的项
fn read_spine<R: Read + Seek>(doc: &mut EpubDoc<R>) -> Vec<SpineDocument> {
    let mut spine = Vec::with_capacity(doc.get_num_chapters());

    for index in 0..doc.get_num_chapters() {
        if !doc.set_current_chapter(index) {
            continue;
        }
        let (Some(path), Some(id)) = (doc.get_current_path(), doc.get_current_id()) else {
            continue;
        };
        let locator = path.to_string_lossy().replace('\\', "/");

        match doc.get_current_str() {
            Some((markup, _mime)) => spine.push(SpineDocument {
                id,
                locator,
                markup,
            }),
            None => {
                tracing::warn!(locator = %locator, "Spine document unreadable, skipped");
            }
        }
    }

    spine
}
