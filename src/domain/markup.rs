//! Markup Utilities - HTML 解析与文本节点处理
//!
//! 基于 `scraper`（html5ever）：
//! - 清洗章节文档中的非正文元素
//! - 提取首个标题
//! - 把文本节点展开成带偏移量的扁平缓冲
//! - 原地改写文本节点后重新序列化

use scraper::{Html, Node, Selector};

/// 清洗时整体删除的元素
const STRIPPED_ELEMENTS: &str =
    "script, style, nav, header, footer, img, picture, source, figure, svg, image";

/// 其文本不属于正文的父元素
const RAW_TEXT_PARENTS: &[&str] = &["script", "style"];

/// 文本不能被包裹标签的父元素
const OPAQUE_PARENTS: &[&str] = &["script", "style", "title", "textarea"];

/// 一个文本节点在扁平缓冲中的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    /// 缓冲内的字节偏移
    pub start: usize,
    pub end: usize,
}

/// 删除脚本、样式、导航与图片类元素，返回序列化后的文档
pub fn sanitize(markup: &str) -> String {
    let mut html = Html::parse_document(markup);

    if let Ok(selector) = Selector::parse(STRIPPED_ELEMENTS) {
        let ids: Vec<_> = html.select(&selector).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    html.html()
}

/// 文档中第一个非空的 h1-h3 标题
pub fn first_heading(markup: &str) -> Option<String> {
    let html = Html::parse_document(markup);
    let selector = Selector::parse("h1, h2, h3").ok()?;

    html.select(&selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

#[inline]
fn element_named(node: Option<&Node>, names: &[&str]) -> bool {
    node.and_then(Node::as_element)
        .is_some_and(|el| names.contains(&el.name()))
}

/// 按文档顺序收集正文文本节点（跳过脚本、样式和纯空白节点）
///
/// 偏移量对应以单个空格连接后的缓冲，见 [`join_fragments`]。
pub fn text_fragments(markup: &str) -> Vec<TextFragment> {
    let html = Html::parse_document(markup);
    let mut fragments = Vec::new();
    let mut offset = 0;

    for node in html.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if element_named(node.parent().map(|p| p.value()), RAW_TEXT_PARENTS) {
            continue;
        }
        let text: &str = text;
        if text.trim().is_empty() {
            continue;
        }

        fragments.push(TextFragment {
            text: text.to_string(),
            start: offset,
            end: offset + text.len(),
        });
        offset += text.len() + 1;
    }

    fragments
}

/// 以单个空格连接所有文本节点
pub fn join_fragments(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 对每个可改写的文本节点调用 `rewrite`，返回 `Some` 时替换其内容
///
/// 没有任何节点被改写时原样返回输入，避免无谓的重新序列化。
pub fn map_text_nodes<F>(markup: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut html = Html::parse_document(markup);

    let replacements: Vec<_> = html
        .tree
        .root()
        .descendants()
        .filter(|node| !element_named(node.parent().map(|p| p.value()), OPAQUE_PARENTS))
        .filter_map(|node| match node.value() {
            Node::Text(text) => rewrite(&**text).map(|new_text| (node.id(), new_text)),
            _ => None,
        })
        .collect();

    if replacements.is_empty() {
        return markup.to_string();
    }

    for (id, new_text) in replacements {
        if let Some(mut node) = html.tree.get_mut(id) {
            if let Node::Text(text) = node.value() {
                text.text = new_text.into();
            }
        }
    }

    html.html()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTER: &str = r#"<html><head><title>Глава</title><style>p { color: red }</style></head>
<body>
<nav><a href="toc.xhtml">Оглавление</a></nav>
<h2>Глава первая</h2>
<p>Иван вошёл.</p>
<script>var x = "Иван";</script>
<figure><img src="a.png"/></figure>
<p>– Здравствуй, – сказал он.</p>
</body></html>"#;

    #[test]
    fn test_sanitize_strips_non_narrative_elements() {
        let cleaned = sanitize(CHAPTER);
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("<style"));
        assert!(!cleaned.contains("<nav"));
        assert!(!cleaned.contains("<img"));
        assert!(!cleaned.contains("<figure"));
        assert!(cleaned.contains("Иван вошёл."));
        assert!(cleaned.contains("<h2>Глава первая</h2>"));
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(first_heading(CHAPTER).as_deref(), Some("Глава первая"));
        assert_eq!(first_heading("<p>без заголовка</p>"), None);
        assert_eq!(
            first_heading("<h1>  </h1><h3>Часть\n  вторая</h3>").as_deref(),
            Some("Часть вторая")
        );
    }

    #[test]
    fn test_text_fragments_skip_scripts_and_whitespace() {
        let fragments = text_fragments(CHAPTER);
        let texts: Vec<_> = fragments.iter().map(|f| f.text.as_str()).collect();

        assert!(texts.contains(&"Иван вошёл."));
        assert!(!texts.iter().any(|t| t.contains("var x")));
        assert!(!texts.iter().any(|t| t.contains("color")));
        assert!(texts.iter().all(|t| !t.trim().is_empty()));
    }

    #[test]
    fn test_fragment_offsets_match_joined_buffer() {
        let fragments = text_fragments("<p>Один</p><p>Два</p><p>Три</p>");
        let buffer = join_fragments(&fragments);

        assert_eq!(buffer, "Один Два Три");
        for fragment in &fragments {
            assert_eq!(&buffer[fragment.start..fragment.end], fragment.text);
        }
    }

    #[test]
    fn test_map_text_nodes_rewrites_body_text_only() {
        let out = map_text_nodes(CHAPTER, |text| {
            text.contains("Иван").then(|| text.replace("Иван", "Пётр"))
        });

        assert!(out.contains("Пётр вошёл."));
        assert!(out.contains("var x = \"Иван\";"));
    }

    #[test]
    fn test_map_text_nodes_without_changes_returns_input() {
        let markup = "<p>Текст</p>";
        assert_eq!(map_text_nodes(markup, |_| None), markup);
    }
}
