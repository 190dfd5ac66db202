//! Work Context - Value Objects

use serde::{Deserialize, Serialize};

/// 树节点在 arena 中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 章节节点的结构类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// 卷
    Volume,
    /// 部
    Part,
    /// 幕
    Act,
    /// 场
    Scene,
    /// 出场（戏剧中的小节）
    Appearance,
    /// 章
    Chapter,
    /// 前言
    Preface,
    /// 人物表
    CastList,
    /// 引言
    Introduction,
    /// 节选
    Excerpt,
    /// 未归类的分节
    Section,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Volume => "volume",
            ElementType::Part => "part",
            ElementType::Act => "act",
            ElementType::Scene => "scene",
            ElementType::Appearance => "appearance",
            ElementType::Chapter => "chapter",
            ElementType::Preface => "preface",
            ElementType::CastList => "cast_list",
            ElementType::Introduction => "introduction",
            ElementType::Excerpt => "excerpt",
            ElementType::Section => "section",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "volume" => Some(ElementType::Volume),
            "part" => Some(ElementType::Part),
            "act" => Some(ElementType::Act),
            "scene" => Some(ElementType::Scene),
            "appearance" => Some(ElementType::Appearance),
            "chapter" => Some(ElementType::Chapter),
            "preface" => Some(ElementType::Preface),
            "cast_list" => Some(ElementType::CastList),
            "introduction" => Some(ElementType::Introduction),
            "excerpt" => Some(ElementType::Excerpt),
            "section" => Some(ElementType::Section),
            _ => None,
        }
    }

    /// 界面显示用的俄文名称
    pub fn label(&self) -> &'static str {
        match self {
            ElementType::Volume => "Том",
            ElementType::Part => "Часть",
            ElementType::Act => "Действие",
            ElementType::Scene => "Сцена",
            ElementType::Appearance => "Явление",
            ElementType::Chapter => "Глава",
            ElementType::Preface => "Предисловие",
            ElementType::CastList => "Действующие лица",
            ElementType::Introduction => "Вступление",
            ElementType::Excerpt => "Отрывки",
            ElementType::Section => "Раздел",
        }
    }
}

impl Default for ElementType {
    fn default() -> Self {
        ElementType::Section
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 整部作品的层级类型
///
/// 由所有分节节点的类型一次性推断，决定罗马数字标题的解释方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyType {
    /// 卷 / 部 / 章
    VolumePartChapter,
    /// 部 / 章
    PartChapter,
    /// 幕 / 场 / 出场
    ActSceneAppearance,
    /// 幕 / 出场
    ActAppearance,
    /// 带人物表的剧本
    Play,
    /// 普通章节结构
    Default,
}

impl HierarchyType {
    /// 是否按剧本解释（罗马数字标题视为出场）
    pub fn is_play_like(&self) -> bool {
        matches!(
            self,
            HierarchyType::Play | HierarchyType::ActSceneAppearance | HierarchyType::ActAppearance
        )
    }
}

impl Default for HierarchyType {
    fn default() -> Self {
        HierarchyType::Default
    }
}

/// 特殊序号：终章排在所有兄弟节点之后
pub const FINAL_CHAPTER_NUMBER: u32 = 1000;

/// 特殊序号：不参与编号的分节（前言、人物表、引言）
pub const UNNUMBERED: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_roundtrip_names() {
        for t in [
            ElementType::Volume,
            ElementType::CastList,
            ElementType::Excerpt,
            ElementType::Section,
        ] {
            assert_eq!(ElementType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ElementType::from_str("unknown"), None);
    }

    #[test]
    fn test_play_like_hierarchies() {
        assert!(HierarchyType::Play.is_play_like());
        assert!(HierarchyType::ActAppearance.is_play_like());
        assert!(!HierarchyType::PartChapter.is_play_like());
        assert!(!HierarchyType::Default.is_play_like());
    }
}
