//! Chapter Lock Port - 出站端口
//!
//! 进程内的按章节互斥，保证同一章节的提及检测串行执行

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// 章节锁的持有凭证，drop 时释放
#[derive(Debug)]
pub struct ChapterLease {
    _guard: OwnedMutexGuard<()>,
}

impl ChapterLease {
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

/// Chapter Lock Port
#[async_trait]
pub trait ChapterLockPort: Send + Sync {
    /// 等待并获取章节锁
    async fn acquire(&self, chapter_id: Uuid) -> ChapterLease;
}
