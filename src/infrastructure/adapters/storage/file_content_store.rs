//! File Content Store - 文件系统内容存储实现
//!
//! 实现 ContentStorePort trait。
//! 引用先做词法检查（拒绝绝对路径和 `..`），再用规范化路径确认仍在根目录内，
//! 以防符号链接把写入带出根目录。

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ContentError, ContentStorePort};

/// 文件系统内容存储
pub struct FileContentStore {
    /// 规范化后的根目录
    root: PathBuf,
}

impl FileContentStore {
    /// 创建存储，根目录不存在时创建
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, ContentError> {
        let root = root.as_ref();

        fs::create_dir_all(root)
            .await
            .map_err(|e| ContentError::IoError(e.to_string()))?;
        let root = fs::canonicalize(root)
            .await
            .map_err(|e| ContentError::IoError(e.to_string()))?;

        tracing::info!(root = %root.display(), "Content store ready");

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 词法解析：只允许普通路径分量
    fn resolve(&self, content_ref: &str) -> Result<PathBuf, ContentError> {
        let relative = Path::new(content_ref);
        let lexically_safe = !content_ref.trim().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if !lexically_safe {
            tracing::warn!(content_ref = %content_ref, "Rejected content reference outside root");
            return Err(ContentError::PathEscape(content_ref.to_string()));
        }

        Ok(self.root.join(relative))
    }

    /// 规范化路径中已存在的最深祖先，确认它在根目录内
    async fn ensure_contained(&self, content_ref: &str, path: &Path) -> Result<(), ContentError> {
        let mut existing = Some(path);
        while let Some(candidate) = existing {
            match fs::canonicalize(candidate).await {
                Ok(canonical) => {
                    if canonical.starts_with(&self.root) {
                        return Ok(());
                    }
                    tracing::warn!(
                        content_ref = %content_ref,
                        resolved = %canonical.display(),
                        "Content reference resolves outside root"
                    );
                    return Err(ContentError::PathEscape(content_ref.to_string()));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => existing = candidate.parent(),
                Err(e) => return Err(ContentError::IoError(e.to_string())),
            }
        }
        Err(ContentError::PathEscape(content_ref.to_string()))
    }

    async fn checked_path(&self, content_ref: &str) -> Result<PathBuf, ContentError> {
        let path = self.resolve(content_ref)?;
        self.ensure_contained(content_ref, &path).await?;
        Ok(path)
    }

    async fn write_file(&self, content_ref: &str, data: &[u8]) -> Result<(), ContentError> {
        let path = self.checked_path(content_ref).await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ContentError::IoError(e.to_string()))?;
            // 新建的目录可能经由符号链接落在根目录外
            self.ensure_contained(content_ref, parent).await?;
        }

        fs::write(&path, data)
            .await
            .map_err(|e| ContentError::IoError(e.to_string()))?;

        tracing::debug!(content_ref = %content_ref, bytes = data.len(), "Content written");

        Ok(())
    }
}

#[async_trait]
impl ContentStorePort for FileContentStore {
    async fn write(&self, content_ref: &str, markup: &str) -> Result<(), ContentError> {
        self.write_file(content_ref, markup.as_bytes()).await
    }

    async fn write_bytes(&self, content_ref: &str, data: &[u8]) -> Result<(), ContentError> {
        self.write_file(content_ref, data).await
    }

    async fn read(&self, content_ref: &str) -> Result<String, ContentError> {
        let path = self.checked_path(content_ref).await?;

        match fs::read_to_string(&path).await {
            Ok(markup) => Ok(markup),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ContentError::NotFound(content_ref.to_string()))
            }
            Err(e) => Err(ContentError::IoError(e.to_string())),
        }
    }

    async fn exists(&self, content_ref: &str) -> Result<bool, ContentError> {
        let path = self.checked_path(content_ref).await?;
        fs::try_exists(&path)
            .await
            .map_err(|e| ContentError::IoError(e.to_string()))
    }

    async fn remove(&self, content_ref: &str) -> Result<(), ContentError> {
        let path = self.checked_path(content_ref).await?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(content_ref = %content_ref, "Content removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContentError::IoError(e.to_string())),
        }
    }

    async fn prune_dir(&self, dir_ref: &str) -> Result<(), ContentError> {
        let path = self.checked_path(dir_ref).await?;

        let mut entries = match fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ContentError::IoError(e.to_string())),
        };
        let is_empty = entries
            .next_entry()
            .await
            .map_err(|e| ContentError::IoError(e.to_string()))?
            .is_none();

        if is_empty {
            fs::remove_dir(&path)
                .await
                .map_err(|e| ContentError::IoError(e.to_string()))?;
            tracing::debug!(dir_ref = %dir_ref, "Empty content directory removed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FileContentStore) {
        let dir = TempDir::new().unwrap();
        let store = FileContentStore::new(dir.path().join("content")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_read_remove() {
        let (_dir, store) = store().await;

        store.write("Бесы/Глава 1_c1.html", "<p>Текст</p>").await.unwrap();
        assert!(store.exists("Бесы/Глава 1_c1.html").await.unwrap());
        assert_eq!(store.read("Бесы/Глава 1_c1.html").await.unwrap(), "<p>Текст</p>");

        store.remove("Бесы/Глава 1_c1.html").await.unwrap();
        assert!(!store.exists("Бесы/Глава 1_c1.html").await.unwrap());
        // 重复删除不报错
        store.remove("Бесы/Глава 1_c1.html").await.unwrap();

        store.prune_dir("Бесы").await.unwrap();
        assert!(!store.root().join("Бесы").exists());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, store) = store().await;
        assert!(matches!(
            store.read("w/missing.html").await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_prune_keeps_non_empty_dir() {
        let (_dir, store) = store().await;
        store.write("shared/a.html", "a").await.unwrap();

        store.prune_dir("shared").await.unwrap();
        assert!(store.exists("shared/a.html").await.unwrap());

        // 不存在的目录忽略
        store.prune_dir("nowhere").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_references() {
        let (dir, store) = store().await;

        for content_ref in ["../outside.html", "a/../../outside.html", "/etc/passwd", "", "  "] {
            let result = store.write(content_ref, "x").await;
            assert!(
                matches!(result, Err(ContentError::PathEscape(_))),
                "{content_ref:?} was accepted"
            );
        }
        assert!(!dir.path().join("outside.html").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_out_of_root() {
        let (dir, store) = store().await;
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, store.root().join("link")).unwrap();

        let result = store.write("link/evil.html", "x").await;

        assert!(matches!(result, Err(ContentError::PathEscape(_))));
        assert!(!outside.join("evil.html").exists());
    }
}
