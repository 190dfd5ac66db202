//! Memory Layer - In-Memory State Management
//!
//! 实现 ChapterLockPort，管理按章节的进程内互斥

mod chapter_locks;

pub use chapter_locks::InMemoryChapterLocks;
