//! Section-Link Resolver
//!
//! 没有自己正文的分支节点继承序号最小且有正文的直接子节点的内容引用。

use super::{NodeIndex, WorkTree};

/// 为缺少正文的分支节点补上内容引用，返回补上的数量
///
/// 按创建顺序倒序处理：子节点总是晚于父节点创建，
/// 因此嵌套分节会先拿到自己的引用，再传给上层。
pub fn resolve_section_links(tree: &mut WorkTree) -> usize {
    let mut linked = 0;

    for index in (0..tree.len()).rev().map(NodeIndex::new) {
        let needs_link = tree
            .get(index)
            .is_some_and(|node| node.is_branch() && node.content_ref().is_none());
        if !needs_link {
            continue;
        }

        let inherited = tree
            .sorted_children(Some(index))
            .into_iter()
            .find_map(|child| {
                tree.get(child)
                    .and_then(|n| n.content_ref())
                    .map(str::to_string)
            });

        if let (Some(content_ref), Some(node)) = (inherited, tree.get_mut(index)) {
            node.set_content_ref(content_ref);
            linked += 1;
        }
    }

    linked
}
