//! In-Memory Chapter Lock Table

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{ChapterLease, ChapterLockPort};

const PRUNE_THRESHOLD: usize = 1024;

/// 章节锁表
///
/// 每个章节一把 `tokio::sync::Mutex`，首次请求时创建；
/// 表超过 `PRUNE_THRESHOLD` 时清理无人持有也无人等待的锁。
#[derive(Default)]
pub struct InMemoryChapterLocks {
    /// chapter_id -> lock
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl InMemoryChapterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前表中的锁数量
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// 清理没有任何引用的锁
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        // 表自身持有一份引用
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before - self.locks.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.locks.len(), "Idle chapter locks pruned");
        }
        removed
    }
}

#[async_trait]
impl ChapterLockPort for InMemoryChapterLocks {
    async fn acquire(&self, chapter_id: Uuid) -> ChapterLease {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        // 先克隆出 Arc 再等待，避免持有 DashMap 分片锁跨越 await
        let lock = self
            .locks
            .entry(chapter_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        tracing::trace!(chapter_id = %chapter_id, "Chapter lock acquired");
        ChapterLease::new(guard)
    }
}
