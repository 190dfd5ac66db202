//! Highlighter - 渲染时的人物标注
//!
//! 逐个文本节点匹配（不跨节点），每段文本只接受互不重叠的匹配，
//! 并用 `<span class="character-highlight">` 包裹。结果只用于展示，不入库。
//!
//! 文本节点内先写入私用区标记，序列化后再替换成标签，
//! 这样匹配到的文字仍由序列化器负责转义。

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::patterns::{rank_patterns, EntityPatterns, RankedPattern};
use crate::domain::markup::map_text_nodes;

const MARK_OPEN: char = '\u{E000}';
const MARK_SPLIT: char = '\u{E001}';
const MARK_CLOSE: char = '\u{E002}';

static OPEN_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("static regex"));

#[inline]
fn is_marker(c: char) -> bool {
    matches!(c, MARK_OPEN | MARK_SPLIT | MARK_CLOSE)
}

/// 为标记中的人物提及加上高亮标注
pub fn render_highlighted(markup: &str, entities: &[EntityPatterns]) -> String {
    let ranked = rank_patterns(entities);
    if ranked.is_empty() {
        return markup.to_string();
    }

    let markup: Cow<'_, str> = if markup.contains(is_marker) {
        Cow::Owned(markup.chars().filter(|c| !is_marker(*c)).collect())
    } else {
        Cow::Borrowed(markup)
    };

    let marked = map_text_nodes(&markup, |text| mark_text(text, &ranked));
    if !marked.contains(MARK_OPEN) {
        return marked;
    }

    OPEN_MARKER
        .replace_all(&marked, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| ranked.get(index))
                .map(open_tag)
                .unwrap_or_default()
        })
        .replace(MARK_CLOSE, "</span>")
}

fn open_tag(ranked: &RankedPattern<'_>) -> String {
    format!(
        r#"<span class="character-highlight" data-character-id="{}" data-original-name="{}">"#,
        ranked.character_id,
        escape_attribute(&ranked.pattern.source)
    )
}

/// 在一段文本内收集所有模式的匹配，按起点稳定排序后接受互不重叠的匹配
fn mark_text(text: &str, ranked: &[RankedPattern<'_>]) -> Option<String> {
    let mut matches: Vec<(usize, usize, usize)> = ranked
        .iter()
        .enumerate()
        .flat_map(|(index, r)| {
            r.pattern
                .regex
                .find_iter(text)
                .map(move |m| (m.start(), m.end(), index))
        })
        .collect();
    if matches.is_empty() {
        return None;
    }
    matches.sort_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(text.len() + matches.len() * 8);
    let mut cursor = 0;
    for (start, end, index) in matches {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push(MARK_OPEN);
        out.push_str(&index.to_string());
        out.push(MARK_SPLIT);
        out.push_str(&text[start..end]);
        out.push(MARK_CLOSE);
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    Some(out)
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
