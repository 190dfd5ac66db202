//! Work Context - Aggregate Root
//!
//! 章节树使用 arena 存储：节点放在 Vec 中，父子关系用下标表示。

use std::collections::HashMap;

use super::entities::NewChapterNode;
use super::{ChapterNode, HierarchyType, NodeIndex, WorkError, FINAL_CHAPTER_NUMBER};

/// WorkTree 聚合根
///
/// 不变量:
/// - 父节点必须先于子节点创建，因此图无环
/// - (父节点, 标题) 唯一，重复创建返回已有节点
#[derive(Debug, Clone, Default)]
pub struct WorkTree {
    nodes: Vec<ChapterNode>,
    roots: Vec<NodeIndex>,
    by_parent_title: HashMap<(Option<NodeIndex>, String), NodeIndex>,
    hierarchy_type: HierarchyType,
}

impl WorkTree {
    pub fn new(hierarchy_type: HierarchyType) -> Self {
        Self {
            hierarchy_type,
            ..Self::default()
        }
    }

    pub fn hierarchy_type(&self) -> HierarchyType {
        self.hierarchy_type
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: NodeIndex) -> Option<&ChapterNode> {
        self.nodes.get(index.get())
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut ChapterNode> {
        self.nodes.get_mut(index.get())
    }

    /// 所有节点（按创建顺序）
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &ChapterNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex::new(i), node))
    }

    pub fn find_child(&self, parent: Option<NodeIndex>, title: &str) -> Option<NodeIndex> {
        self.by_parent_title
            .get(&(parent, title.to_string()))
            .copied()
    }

    /// 插入节点；同一父节点下同名节点已存在时直接返回它
    pub fn insert(&mut self, node: NewChapterNode) -> Result<NodeIndex, WorkError> {
        if node.title.trim().is_empty() {
            return Err(WorkError::EmptyTitle);
        }
        if let Some(parent) = node.parent {
            if parent.get() >= self.nodes.len() {
                return Err(WorkError::ParentNotFound(parent));
            }
        }
        if let Some(existing) = self.find_child(node.parent, &node.title) {
            return Ok(existing);
        }

        let index = NodeIndex::new(self.nodes.len());
        let parent = node.parent;
        let key = (parent, node.title.clone());
        self.nodes.push(ChapterNode::new(node));
        self.by_parent_title.insert(key, index);

        match parent {
            Some(p) => self.nodes[p.get()].push_child(index),
            None => self.roots.push(index),
        }

        Ok(index)
    }

    /// 某父节点下的直接子节点（None 表示根）
    pub fn children_of(&self, parent: Option<NodeIndex>) -> &[NodeIndex] {
        match parent {
            Some(p) => self
                .nodes
                .get(p.get())
                .map(|n| n.children())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }

    /// 按序号排序的子节点，序号相同时保持创建顺序
    pub fn sorted_children(&self, parent: Option<NodeIndex>) -> Vec<NodeIndex> {
        let mut children = self.children_of(parent).to_vec();
        children.sort_by_key(|i| (self.nodes[i.get()].number(), *i));
        children
    }

    /// 兄弟节点中是否已有该序号（0 不参与唯一性检查）
    pub fn number_taken(&self, parent: Option<NodeIndex>, number: u32) -> bool {
        number != 0
            && self
                .children_of(parent)
                .iter()
                .any(|i| self.nodes[i.get()].number() == number)
    }

    /// 顺序编号：分节只与分节兄弟比较，叶子与全部兄弟比较；终章不计入
    pub fn next_number(&self, parent: Option<NodeIndex>, is_section: bool) -> u32 {
        self.children_of(parent)
            .iter()
            .map(|i| &self.nodes[i.get()])
            .filter(|n| !is_section || n.is_section())
            .map(|n| n.number())
            .filter(|&n| n != FINAL_CHAPTER_NUMBER)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// 深度优先的阅读顺序
    pub fn reading_order(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.sorted_children(None).into_iter().rev().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.sorted_children(Some(index)).into_iter().rev());
        }
        order
    }

    /// 显示编号，例如 "2.3"
    pub fn display_number(&self, index: NodeIndex) -> String {
        let mut parts = Vec::new();
        let mut current = self.get(index);
        while let Some(node) = current {
            parts.push(node.number().to_string());
            current = node.parent().and_then(|p| self.get(p));
        }
        parts.reverse();
        parts.join(".")
    }
}
