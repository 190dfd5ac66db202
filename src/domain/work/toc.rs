//! TOC Normalizer - 目录扁平化
//!
//! 把嵌套目录展开为深度优先的扁平序列，并标记每一项是否为分节。

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ElementType;

/// 源文档目录中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    pub locator: Option<String>,
    #[serde(default)]
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, locator: Option<&str>) -> Self {
        Self {
            title: title.into(),
            locator: locator.map(str::to_string),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineEntry>) -> Self {
        self.children = children;
        self
    }
}

/// 扁平化后的目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub locator: Option<String>,
    pub level: usize,
    /// 位置编码，例如 [0, 2, 1]
    pub path: Vec<usize>,
    pub is_section: bool,
    /// 由修正规则强制指定的类型
    pub element_type: Option<ElementType>,
}

impl TocEntry {
    /// 点分形式的位置，例如 "0.2.1"
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// 出现即视为分节的关键词
const SECTION_KEYWORDS: &[&str] = &["предисловие", "действующие лица", "лица"];

static SECTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(том|часть|действие|сцена|явление)[\s\-]+").expect("static regex")
});

static ROMAN_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ivxlcdm]+$").expect("static regex"));

/// 去标点、小写、ё→е
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .replace('ё', "е")
        .trim()
        .to_string()
}

/// 压缩连续空白
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `phrase` 作为完整单词出现在 `haystack` 中
pub fn contains_word(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        before.map_or(true, |c| !c.is_alphanumeric()) && after.map_or(true, |c| !c.is_alphanumeric())
    })
}

/// 标题是否表示分节
pub fn is_section(title: &str) -> bool {
    let normalized = normalize_title(title);
    if normalized.is_empty() {
        return false;
    }
    if SECTION_KEYWORDS
        .iter()
        .any(|keyword| contains_word(&normalized, keyword))
    {
        return true;
    }
    SECTION_PREFIX.is_match(&normalized) || ROMAN_ONLY.is_match(&normalized)
}

/// 标题为空时，用定位路径的文件名生成标题
pub fn title_from_locator(locator: Option<&str>) -> String {
    let stem = locator
        .map(|l| l.split('#').next().unwrap_or(l))
        .and_then(|l| l.rsplit('/').next())
        .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
        .filter(|stem| !stem.is_empty());

    match stem {
        Some(stem) => title_case(&stem.replace('_', " ")),
        None => "Без названия".to_string(),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// 展开嵌套目录，保持深度优先先序
pub fn normalize_outline(outline: &[OutlineEntry]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    flatten(outline, 0, &[], &mut entries);
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn flatten(items: &[OutlineEntry], level: usize, parent_path: &[usize], out: &mut Vec<TocEntry>) {
    for (i, item) in items.iter().enumerate() {
        let mut path = parent_path.to_vec();
        path.push(i);

        let mut title = clean_text(&item.title);
        if title.is_empty() {
            title = title_from_locator(item.locator.as_deref());
        }

        out.push(TocEntry {
            is_section: is_section(&title),
            title,
            locator: item.locator.clone().filter(|l| !l.trim().is_empty()),
            level,
            path: path.clone(),
            element_type: None,
        });

        flatten(&item.children, level + 1, &path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_section_keywords() {
        assert!(is_section("Предисловие"));
        assert!(is_section("ДЕЙСТВУЮЩИЕ ЛИЦА:"));
        assert!(is_section("Лица"));
        assert!(!is_section("Бэла"));
        // "лица" как часть другого слова
        assert!(!is_section("Столица"));
    }

    #[test]
    fn test_is_section_prefixes() {
        assert!(is_section("Том первый"));
        assert!(is_section("Часть II"));
        assert!(is_section("Действие — третье"));
        assert!(is_section("XII"));
        assert!(!is_section("Глава первая"));
        assert!(!is_section("Потом"));
    }

    #[test]
    fn test_normalize_outline_preorder() {
        let outline = vec![
            OutlineEntry::new("Часть I", Some("p1.xhtml")).with_children(vec![
                OutlineEntry::new("Глава 1", Some("c1.xhtml")),
                OutlineEntry::new("Глава 2", Some("c2.xhtml")),
            ]),
            OutlineEntry::new("Часть II", Some("p2.xhtml"))
                .with_children(vec![OutlineEntry::new("Глава 1", Some("c3.xhtml"))]),
        ];

        let entries = normalize_outline(&outline);
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Часть I", "Глава 1", "Глава 2", "Часть II", "Глава 1"]
        );
        assert_eq!(entries[2].dotted_path(), "0.1");
        assert_eq!(entries[2].level, 1);
        assert!(entries[0].is_section);
        assert!(!entries[1].is_section);
    }

    #[test]
    fn test_title_fallback_from_locator() {
        let outline = vec![
            OutlineEntry::new("  ", Some("Text/chapter_one.xhtml#top")),
            OutlineEntry::new("", None),
        ];
        let entries = normalize_outline(&outline);
        assert_eq!(entries[0].title, "Chapter One");
        assert_eq!(entries[1].title, "Без названия");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Глава \n\t первая "), "Глава первая");
    }
}
