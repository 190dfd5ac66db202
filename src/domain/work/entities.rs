//! Work Context - Entities

use uuid::Uuid;

use super::{ElementType, NodeIndex};

/// 章节树节点
///
/// 不变量:
/// - parent 总是指向在本节点之前创建的节点
/// - 除 0 外，number 在同一父节点下唯一
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterNode {
    id: Uuid,
    parent: Option<NodeIndex>,
    element_type: ElementType,
    number: u32,
    title: String,
    level: usize,
    is_section: bool,
    /// 源文档中的内容定位（href，可能带 #fragment）
    locator: Option<String>,
    /// 清洗后正文的存储引用
    content_ref: Option<String>,
    children: Vec<NodeIndex>,
}

/// 创建节点所需的字段
#[derive(Debug, Clone)]
pub struct NewChapterNode {
    pub parent: Option<NodeIndex>,
    pub element_type: ElementType,
    pub number: u32,
    pub title: String,
    pub level: usize,
    pub is_section: bool,
    pub locator: Option<String>,
}

impl ChapterNode {
    pub(super) fn new(node: NewChapterNode) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: node.parent,
            element_type: node.element_type,
            number: node.number,
            title: node.title,
            level: node.level,
            is_section: node.is_section,
            locator: node.locator,
            content_ref: None,
            children: Vec::new(),
        }
    }

    pub(super) fn push_child(&mut self, child: NodeIndex) {
        self.children.push(child);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_section(&self) -> bool {
        self.is_section
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn content_ref(&self) -> Option<&str> {
        self.content_ref.as_deref()
    }

    pub fn set_content_ref(&mut self, content_ref: impl Into<String>) {
        self.content_ref = Some(content_ref.into());
    }

    /// 子节点（按创建顺序）
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// 分支节点：本身是分节，或者有子节点
    pub fn is_branch(&self) -> bool {
        self.is_section || !self.children.is_empty()
    }
}
