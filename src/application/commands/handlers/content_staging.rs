//! Content Staging - 导入期间的内容写入保护
//!
//! 记录一次导入写入的所有文件；未提交时（包括提前返回和 drop）全部删除。

use std::sync::Arc;

use crate::application::ports::{ContentError, ContentStorePort};

pub struct ContentStaging {
    store: Arc<dyn ContentStorePort>,
    written: Vec<String>,
    committed: bool,
}

impl ContentStaging {
    pub fn new(store: Arc<dyn ContentStorePort>) -> Self {
        Self {
            store,
            written: Vec::new(),
            committed: false,
        }
    }

    /// 写入文本内容并登记
    pub async fn write(&mut self, content_ref: &str, markup: &str) -> Result<(), ContentError> {
        // 先登记：写入中途失败留下的残片也要清理
        self.written.push(content_ref.to_string());
        self.store.write(content_ref, markup).await
    }

    /// 写入二进制内容并登记
    pub async fn write_bytes(&mut self, content_ref: &str, data: &[u8]) -> Result<(), ContentError> {
        self.written.push(content_ref.to_string());
        self.store.write_bytes(content_ref, data).await
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    /// 保留所有已写入的文件
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// 立即删除所有已写入的文件
    pub async fn rollback(mut self) {
        let refs = std::mem::take(&mut self.written);
        remove_all(self.store.as_ref(), refs).await;
    }
}

async fn remove_all(store: &dyn ContentStorePort, refs: Vec<String>) {
    let count = refs.len();
    for content_ref in refs {
        if let Err(e) = store.remove(&content_ref).await {
            tracing::warn!(content_ref = %content_ref, error = %e, "Failed to remove staged content");
        }
    }
    if count > 0 {
        tracing::info!(files = count, "Staged content rolled back");
    }
}

impl Drop for ContentStaging {
    fn drop(&mut self) {
        if self.committed || self.written.is_empty() {
            return;
        }

        let refs = std::mem::take(&mut self.written);
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    remove_all(store.as_ref(), refs).await;
                });
            }
            Err(_) => {
                tracing::error!(
                    files = refs.len(),
                    "Content staging dropped outside a runtime, staged files left behind"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MemoryContentStore;

    #[tokio::test]
    async fn test_commit_keeps_files() {
        let store = Arc::new(MemoryContentStore::default());
        let mut staging = ContentStaging::new(store.clone());
        staging.write("w/a.html", "<p>a</p>").await.unwrap();
        staging.commit();

        assert!(store.contains("w/a.html"));
    }

    #[tokio::test]
    async fn test_rollback_removes_files() {
        let store = Arc::new(MemoryContentStore::default());
        let mut staging = ContentStaging::new(store.clone());
        staging.write("w/a.html", "<p>a</p>").await.unwrap();
        staging.write_bytes("covers/c.png", &[1, 2, 3]).await.unwrap();
        assert_eq!(staging.written().len(), 2);

        staging.rollback().await;

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_drop_without_commit_removes_files() {
        let store = Arc::new(MemoryContentStore::default());
        {
            let mut staging = ContentStaging::new(store.clone());
            staging.write("w/a.html", "<p>a</p>").await.unwrap();
        }

        // 删除在后台任务中进行
        for _ in 0..50 {
            if store.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_still_cleaned_up() {
        let store = Arc::new(MemoryContentStore::default());
        let mut staging = ContentStaging::new(store.clone());
        let result = staging.write("../escape.html", "x").await;

        assert!(matches!(result, Err(ContentError::PathEscape(_))));
        assert_eq!(staging.written(), &["../escape.html".to_string()]);
        staging.rollback().await;
        assert!(store.is_empty());
    }
}
