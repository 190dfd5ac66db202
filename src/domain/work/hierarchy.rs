//! Hierarchy Builder - 章节树构建
//!
//! 根据扁平目录的层级确定父子关系，推断节点类型并解析序号。

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::entities::NewChapterNode;
use super::numbering::{extract_number, is_roman_numeral};
use super::toc::{contains_word, is_section, normalize_title, title_from_locator, TocEntry};
use super::{
    ElementType, HierarchyType, NodeIndex, WorkError, WorkTree, FINAL_CHAPTER_NUMBER, UNNUMBERED,
};

/// 关键词 → 类型，按优先级排列
const KEYWORD_TYPES: &[(&str, ElementType)] = &[
    ("действующие лица", ElementType::CastList),
    ("лица", ElementType::CastList),
    ("предисловие", ElementType::Preface),
    ("вступление", ElementType::Introduction),
    ("заключительная", ElementType::Chapter),
    ("отрывки", ElementType::Excerpt),
    ("том", ElementType::Volume),
    ("часть", ElementType::Part),
    ("действие", ElementType::Act),
    ("сцена", ElementType::Scene),
    ("явление", ElementType::Appearance),
    ("глава", ElementType::Chapter),
];

const FINAL_CHAPTER_MARKER: &str = "заключительная";

static HEADING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-]*(\[x?\])?\s*").expect("static regex"));

/// 去掉标题前的破折号和复选框标记
pub fn clean_heading(title: &str) -> String {
    HEADING_NOISE.replace(title, "").trim().to_string()
}

/// 根据标题推断节点类型
pub fn element_type_for(title: &str, hierarchy: HierarchyType) -> ElementType {
    let normalized = normalize_title(title);

    if let Some((_, element_type)) = KEYWORD_TYPES
        .iter()
        .find(|(keyword, _)| contains_word(&normalized, keyword))
    {
        return *element_type;
    }

    if is_roman_numeral(&normalized) {
        return if hierarchy.is_play_like() {
            ElementType::Appearance
        } else {
            ElementType::Chapter
        };
    }

    ElementType::Section
}

/// 扫描所有分节项，推断整部作品的层级类型
pub fn detect_hierarchy_type(entries: &[TocEntry]) -> HierarchyType {
    let types: HashSet<ElementType> = entries
        .iter()
        .filter(|e| e.is_section)
        .map(|e| {
            e.element_type
                .unwrap_or_else(|| element_type_for(&e.title, HierarchyType::Default))
        })
        .collect();

    let has = |t: ElementType| types.contains(&t);

    if has(ElementType::Volume) && has(ElementType::Part) {
        HierarchyType::VolumePartChapter
    } else if has(ElementType::Part) {
        HierarchyType::PartChapter
    } else if has(ElementType::Act) && has(ElementType::Scene) && has(ElementType::Appearance) {
        HierarchyType::ActSceneAppearance
    } else if has(ElementType::Act) && has(ElementType::Appearance) {
        HierarchyType::ActAppearance
    } else if has(ElementType::CastList) {
        HierarchyType::Play
    } else {
        HierarchyType::Default
    }
}

/// 解析节点序号
///
/// 前言、人物表、引言为 0；终章为 1000；
/// 其余先从标题提取，提取失败或与兄弟节点冲突时顺序分配。
pub fn resolve_number(
    tree: &WorkTree,
    parent: Option<NodeIndex>,
    title: &str,
    element_type: ElementType,
    is_section: bool,
) -> u32 {
    if matches!(
        element_type,
        ElementType::Preface | ElementType::CastList | ElementType::Introduction
    ) {
        return UNNUMBERED;
    }

    if contains_word(&normalize_title(title), FINAL_CHAPTER_MARKER) {
        return FINAL_CHAPTER_NUMBER;
    }

    match extract_number(title) {
        Some(number) if !tree.number_taken(parent, number) => number,
        extracted => {
            let mut number = tree.next_number(parent, is_section);
            while tree.number_taken(parent, number) {
                number += 1;
            }
            if is_section || extracted.is_some() {
                tracing::warn!(
                    title = %title,
                    extracted = ?extracted,
                    assigned = number,
                    "Could not resolve ordinal from title, using sequential number"
                );
            }
            number
        }
    }
}

/// 由扁平目录构建章节树
pub fn build_hierarchy(entries: &[TocEntry]) -> Result<WorkTree, WorkError> {
    let hierarchy = detect_hierarchy_type(entries);
    let mut tree = WorkTree::new(hierarchy);
    // 每个层级当前"打开"的节点
    let mut open: BTreeMap<usize, NodeIndex> = BTreeMap::new();

    for entry in entries {
        let mut title = clean_heading(&entry.title);
        if title.is_empty() {
            title = title_from_locator(entry.locator.as_deref());
        }

        let parent = if entry.level == 0 {
            None
        } else {
            open.range(..entry.level).next_back().map(|(_, index)| *index)
        };

        let index = match tree.find_child(parent, &title) {
            Some(existing) => existing,
            None => {
                let element_type = entry
                    .element_type
                    .unwrap_or_else(|| element_type_for(&title, hierarchy));
                let number = resolve_number(&tree, parent, &title, element_type, entry.is_section);
                tree.insert(NewChapterNode {
                    parent,
                    element_type,
                    number,
                    title,
                    level: entry.level,
                    is_section: entry.is_section,
                    locator: entry.locator.clone(),
                })?
            }
        };

        open.insert(entry.level, index);
        open.retain(|level, _| *level <= entry.level);
    }

    tracing::debug!(
        nodes = tree.len(),
        hierarchy = ?hierarchy,
        "Chapter tree built from table of contents"
    );

    Ok(tree)
}

/// 阅读顺序中的一个文档（目录不可用时使用）
#[derive(Debug, Clone)]
pub struct SpineEntry {
    pub title: String,
    pub locator: String,
}

/// 目录缺失时按阅读顺序构建扁平结构：
/// 分节成为根节点，之后的普通文档挂在最近的分节下
pub fn build_from_spine(items: &[SpineEntry]) -> Result<WorkTree, WorkError> {
    if items.is_empty() {
        return Err(WorkError::EmptyDocument);
    }

    let mut tree = WorkTree::new(HierarchyType::Default);
    let mut current_section: Option<NodeIndex> = None;
    let mut seen: HashSet<&str> = HashSet::new();

    for item in items {
        if !seen.insert(item.locator.as_str()) {
            continue;
        }

        let mut title = clean_heading(&item.title);
        if title.is_empty() {
            title = title_from_locator(Some(&item.locator));
        }

        let section = is_section(&title);
        let parent = if section { None } else { current_section };
        if tree.find_child(parent, &title).is_some() {
            continue;
        }

        let element_type = if section {
            element_type_for(&title, HierarchyType::Default)
        } else {
            ElementType::Chapter
        };
        let number = resolve_number(&tree, parent, &title, element_type, section);
        let index = tree.insert(NewChapterNode {
            parent,
            element_type,
            number,
            title,
            level: usize::from(parent.is_some()),
            is_section: section,
            locator: Some(item.locator.clone()),
        })?;

        if section {
            current_section = Some(index);
        }
    }

    tracing::debug!(nodes = tree.len(), "Chapter tree built from reading order");

    Ok(tree)
}
