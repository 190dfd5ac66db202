//! JSON Character Catalog
//!
//! 文件格式：`{ "作品键": { "规范名": ["变体", ...] } }`。
//! 作品键与源文件名（去扩展名）做不区分大小写的双向子串匹配，
//! 多个键匹配时取最长的键。

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::application::ports::{CatalogEntry, CatalogError, CharacterCatalogPort};

type CatalogFile = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// JSON 人物名录
pub struct JsonCharacterCatalog {
    path: PathBuf,
    works: RwLock<CatalogFile>,
}

impl JsonCharacterCatalog {
    /// 读取名录文件；文件不存在时得到空名录
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let catalog = Self {
            path: path.as_ref().to_path_buf(),
            works: RwLock::new(CatalogFile::new()),
        };
        catalog.reload().await?;
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<CatalogFile, CatalogError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "Character catalog not found, no characters will be imported");
                return Ok(CatalogFile::new());
            }
            Err(e) => return Err(CatalogError::IoError(e.to_string())),
        };

        serde_json::from_str(&raw).map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}

/// 作品键是否与文件名匹配
fn key_matches(key: &str, filename: &str) -> bool {
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return false;
    }
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_lowercase();

    stem.contains(&key) || (!stem.is_empty() && key.contains(&stem))
}

#[async_trait]
impl CharacterCatalogPort for JsonCharacterCatalog {
    fn lookup(&self, filename: &str) -> Vec<CatalogEntry> {
        let works = self.works.read().unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some((key, characters)) = works
            .iter()
            .filter(|(key, _)| key_matches(key, filename))
            .max_by_key(|(key, _)| key.chars().count())
        else {
            tracing::debug!(filename = %filename, "No catalog entry for work");
            return Vec::new();
        };

        tracing::debug!(filename = %filename, key = %key, characters = characters.len(), "Catalog entry matched");

        characters
            .iter()
            .map(|(name, variants)| CatalogEntry {
                name: name.clone(),
                variants: variants.clone(),
            })
            .collect()
    }

    async fn reload(&self) -> Result<usize, CatalogError> {
        let works = self.read_file().await?;
        let count = works.len();

        *self.works.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = works;

        tracing::info!(path = %self.path.display(), works = count, "Character catalog loaded");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "geroi_nashego_vremeni": {
            "Печорин": ["Григорий Александрович"],
            "Бэла": []
        },
        "geroi": {
            "Другой": []
        }
    }"#;

    #[tokio::test]
    async fn test_lookup_prefers_longest_matching_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("characters.json");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = JsonCharacterCatalog::load(&path).await.unwrap();
        let entries = catalog.lookup("Lermontov_Geroi_Nashego_Vremeni.epub");

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Бэла", "Печорин"]);
        assert_eq!(entries[1].variants, vec!["Григорий Александрович"]);
        assert!(catalog.lookup("besy.epub").is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = JsonCharacterCatalog::load(dir.path().join("none.json")).await.unwrap();
        assert!(catalog.lookup("anything.epub").is_empty());
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes_and_keeps_old_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("characters.json");
        std::fs::write(&path, r#"{"besy": {"Ставрогин": []}}"#).unwrap();
        let catalog = JsonCharacterCatalog::load(&path).await.unwrap();

        std::fs::write(&path, CATALOG).unwrap();
        assert_eq!(catalog.reload().await.unwrap(), 2);
        assert!(catalog.lookup("besy.epub").is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(catalog.reload().await, Err(CatalogError::ParseError(_))));
        assert_eq!(catalog.lookup("geroi.epub").len(), 2);
    }

    #[test]
    fn test_key_matches_both_directions() {
        assert!(key_matches("Besy", "dostoevsky_besy.epub"));
        assert!(key_matches("dostoevsky_besy_full", "besy.epub"));
        assert!(!key_matches("", "besy.epub"));
        assert!(!key_matches("idiot", "besy.epub"));
    }
}
