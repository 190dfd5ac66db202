//! Mention Scanner - 人物提及检测
//!
//! 在章节正文的扁平文本缓冲上运行所有人物的模式：
//! 较长的来源形式优先，已接受的区间不再重叠；
//! 为每个提及收集上下文（对话段落整体展开）并去重。

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use super::patterns::{rank_patterns, EntityPatterns};
use crate::domain::markup::{join_fragments, text_fragments, TextFragment};

/// 上下文的基本半径（文本节点数）
const CONTEXT_RADIUS: usize = 3;
/// 沿对话段落向两侧最多走的节点数
const DIALOGUE_REACH: usize = 10;
/// 对话段落两侧额外保留的节点数
const DIALOGUE_MARGIN: usize = 2;
/// 去重时比较的上下文前缀长度（字符）
const DEDUP_PREFIX_CHARS: usize = 100;
/// 折叠重复时考虑的最长词序列
const MAX_REPEAT_WORDS: usize = 32;
/// 入库上下文的最大长度（字符）
pub const MAX_STORED_CONTEXT_CHARS: usize = 65_535;

static DASH_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([–—])\s*").expect("static regex"));

static COMMA_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*([–—])").expect("static regex"));

/// 一次检测到的提及
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    pub character_id: Uuid,
    /// 文本中实际出现的形式
    pub matched: String,
    /// 命中的来源形式
    pub source_form: String,
    pub context: String,
    /// 缓冲内的字节区间
    pub start: usize,
    pub end: usize,
}

/// 在章节标记中检测所有人物的提及，结果按出现位置排序
pub fn scan_mentions(markup: &str, entities: &[EntityPatterns]) -> Vec<MentionCandidate> {
    let fragments = text_fragments(markup);
    if fragments.is_empty() || entities.is_empty() {
        return Vec::new();
    }
    let buffer = join_fragments(&fragments);

    let mut accepted: Vec<(usize, usize)> = Vec::new();
    let mut candidates = Vec::new();
    // 同一文本节点内的提及共用一个上下文
    let mut contexts: HashMap<usize, String> = HashMap::new();

    for ranked in rank_patterns(entities) {
        for found in ranked.pattern.regex.find_iter(&buffer) {
            let (start, end) = (found.start(), found.end());
            if accepted.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }
            let Some(owner) = owning_fragment(&fragments, start) else {
                continue;
            };

            accepted.push((start, end));
            candidates.push(MentionCandidate {
                character_id: ranked.character_id,
                matched: found.as_str().to_string(),
                source_form: ranked.pattern.source.clone(),
                context: contexts
                    .entry(owner)
                    .or_insert_with(|| build_context(&fragments, owner))
                    .clone(),
                start,
                end,
            });
        }
    }

    candidates.sort_by_key(|c| c.start);
    deduplicate(candidates)
}

/// 包含缓冲偏移 `offset` 的文本节点下标
fn owning_fragment(fragments: &[TextFragment], offset: usize) -> Option<usize> {
    let index = fragments.partition_point(|f| f.end <= offset);
    fragments
        .get(index)
        .filter(|f| f.start <= offset)
        .map(|_| index)
}

#[inline]
fn is_dialogue_line(text: &str) -> bool {
    text.trim_start()
        .starts_with(|c: char| matches!(c, '—' | '–' | '-'))
}

/// 以 `center` 为中心的上下文窗口（闭区间）
///
/// 窗口内出现以破折号开头的行时，沿连续的对话行向两侧展开，再加上余量。
fn context_window(fragments: &[TextFragment], center: usize) -> (usize, usize) {
    let last = fragments.len() - 1;
    let mut from = center.saturating_sub(CONTEXT_RADIUS);
    let mut to = (center + CONTEXT_RADIUS).min(last);

    if !fragments[from..=to].iter().any(|f| is_dialogue_line(&f.text)) {
        return (from, to);
    }

    let mut dialogue_start = from;
    let lower = center.saturating_sub(DIALOGUE_REACH);
    for i in (lower + 1..=center).rev() {
        if is_dialogue_line(&fragments[i].text) {
            dialogue_start = i;
        } else if i + 1 < center {
            break;
        }
    }

    let mut dialogue_end = to;
    let upper = (center + DIALOGUE_REACH).min(fragments.len());
    for (i, fragment) in fragments.iter().enumerate().take(upper).skip(center) {
        if is_dialogue_line(&fragment.text) {
            dialogue_end = i;
        } else if i > center + 1 {
            break;
        }
    }

    from = dialogue_start.saturating_sub(DIALOGUE_MARGIN);
    to = (dialogue_end + DIALOGUE_MARGIN).min(last);
    (from, to)
}

/// 拼接上下文：跳过空片段和紧邻重复的片段，规范破折号空格，折叠重复词序列
fn build_context(fragments: &[TextFragment], center: usize) -> String {
    let (from, to) = context_window(fragments, center);

    let mut parts: Vec<&str> = Vec::new();
    for fragment in &fragments[from..=to] {
        let text = fragment.text.trim();
        if text.is_empty() || parts.last() == Some(&text) {
            continue;
        }
        parts.push(text);
    }

    let joined = parts.join(" ");
    let spaced = DASH_SPACING.replace_all(&joined, " $1 ");
    let spaced = COMMA_DASH.replace_all(&spaced, ", $1");
    collapse_repeats(spaced.trim())
}

/// 折叠紧邻重复的词序列，例如 "a b a b c" → "a b c"
///
/// 只考虑不超过 `MAX_REPEAT_WORDS` 个词的序列。
fn collapse_repeats(text: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        words.push(word);
        let len = words.len();
        let longest = (len / 2).min(MAX_REPEAT_WORDS);
        if let Some(k) = (1..=longest).find(|&k| words[len - k..] == words[len - 2 * k..len - k]) {
            words.truncate(len - k);
        }
    }
    words.join(" ")
}

fn dedup_key(candidate: &MentionCandidate) -> (String, Uuid) {
    let normalized = candidate.context.split_whitespace().collect::<Vec<_>>().join(" ");
    let prefix: String = normalized.chars().take(DEDUP_PREFIX_CHARS).collect();
    (prefix, candidate.character_id)
}

/// 同一人物、上下文前缀相同的提及只保留第一个
fn deduplicate(candidates: Vec<MentionCandidate>) -> Vec<MentionCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(dedup_key(c)))
        .collect()
}

/// 入库前清洗上下文：去掉不可打印字符、BOM、NUL、替换字符，折叠空白并截断
pub fn clean_text_for_storage(text: &str) -> String {
    let printable: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .filter(|c| !matches!(c, '\u{feff}' | '\u{fffd}' | '\u{200b}'))
        .collect();

    printable
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_STORED_CONTEXT_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::character::{compile_all, Character};

    fn entities(characters: &[Character]) -> Vec<EntityPatterns> {
        compile_all(characters)
    }

    fn character(name: &str, variants: &[&str]) -> Character {
        Character::new(
            Uuid::nil(),
            name,
            variants.iter().map(|v| v.to_string()).collect(),
        )
    }

    #[test]
    fn test_longer_source_wins_at_same_position() {
        let ivan = character("Иван", &[]);
        let full = character("Иван Петрович", &[]);
        let compiled = entities(&[ivan.clone(), full.clone()]);

        let found = scan_mentions("<p>Иван Петрович вошёл в комнату.</p>", &compiled);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].character_id, full.id());
        assert_eq!(found[0].matched, "Иван Петрович");
    }

    #[test]
    fn test_name_inside_longer_word_is_not_matched() {
        let ivan = character("Иван", &[]);
        let ivanovich = character("Иванович", &[]);
        let compiled = entities(&[ivan, ivanovich.clone()]);

        let found = scan_mentions("<p>Иванович пришёл.</p>", &compiled);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].character_id, ivanovich.id());
    }

    #[test]
    fn test_accepted_spans_do_not_overlap() {
        let compiled = entities(&[
            character("Максим Максимыч", &["Максимыч"]),
            character("Максим", &[]),
        ]);
        let filler: String = (0..8).map(|i| format!("<p>Абзац {i}.</p>")).collect();
        let markup = format!(
            "<p>Максим Максимыч курил трубку.</p>{filler}<p>Потом Максим ушёл, а Максимыч остался.</p>"
        );
        let found = scan_mentions(&markup, &compiled);

        for (i, a) in found.iter().enumerate() {
            for b in &found[i + 1..] {
                assert!(a.end <= b.start || b.end <= a.start);
            }
        }
        assert!(found.iter().any(|m| m.matched == "Максим Максимыч"));
        assert!(found.iter().any(|m| m.matched == "Максимыч"));
        assert!(found.iter().any(|m| m.matched == "Максим"));
    }

    #[test]
    fn test_variant_in_same_context_is_deduplicated() {
        let compiled = entities(&[character("Максим Максимыч", &["Максимыч"])]);
        let found = scan_mentions(
            "<p>Максим Максимыч курил трубку, а потом Максимыч ушёл.</p>",
            &compiled,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].matched, "Максим Максимыч");
    }

    #[test]
    fn test_large_text_node_stays_bounded() {
        let compiled = entities(&[character("Печорин", &[])]);
        let words: Vec<String> = (0..20_000).map(|i| format!("слово{i}")).collect();
        let markup = format!("<p>Печорин {} Печорин.</p>", words.join(" "));

        let started = std::time::Instant::now();
        let found = scan_mentions(&markup, &compiled);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].context.split_whitespace().count(), 20_002);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_declined_forms_are_found() {
        let compiled = entities(&[character("Бэла", &[])]);
        let filler: String = (0..8).map(|i| format!("<p>Абзац {i}.</p>")).collect();
        let markup = format!(
            "<p>Он смотрел на Бэлу.</p>{filler}<p>Отец Бэлы молчал.</p>{filler}<p>С Бэлой было иначе.</p>"
        );
        let found = scan_mentions(&markup, &compiled);
        let matched: Vec<_> = found.iter().map(|m| m.matched.as_str()).collect();

        assert_eq!(matched, vec!["Бэлу", "Бэлы", "Бэлой"]);
    }

    #[test]
    fn test_script_text_is_ignored() {
        let compiled = entities(&[character("Казбич", &[])]);
        let found = scan_mentions(
            "<p>Ничего.</p><script>var name = 'Казбич';</script>",
            &compiled,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_plain_context_spans_three_nodes_each_way() {
        let compiled = entities(&[character("Печорин", &[])]);
        let markup: String = (0..10)
            .map(|i| {
                if i == 5 {
                    "<p>Печорин молчал.</p>".to_string()
                } else {
                    format!("<p>Абзац {i}.</p>")
                }
            })
            .collect();

        let found = scan_mentions(&markup, &compiled);

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].context,
            "Абзац 2. Абзац 3. Абзац 4. Печорин молчал. Абзац 6. Абзац 7. Абзац 8."
        );
    }

    #[test]
    fn test_dialogue_context_spans_whole_block() {
        let compiled = entities(&[character("Грушницкий", &[])]);
        let markup = [
            "<p>Утро было ясное.</p>",
            "<p>Я вышел к источнику.</p>",
            "<p>Там никого не было.</p>",
            "<p>Потом пришли двое.</p>",
            "<p>– Здравствуйте, – сказал я.</p>",
            "<p>– Добрый день.</p>",
            "<p>– Как здоровье?</p>",
            "<p>– Благодарю.</p>",
            "<p>– Грушницкий здесь?</p>",
            "<p>– Нет.</p>",
            "<p>– Жаль.</p>",
            "<p>– Отчего же?</p>",
            "<p>Мы разошлись.</p>",
            "<p>День тянулся.</p>",
            "<p>Вечером был бал.</p>",
        ]
        .concat();

        let found = scan_mentions(&markup, &compiled);

        assert_eq!(found.len(), 1);
        let context = &found[0].context;
        assert!(context.starts_with("Там никого не было."), "{context}");
        assert!(context.contains("– Здравствуйте, – сказал я."));
        assert!(context.contains("– Отчего же?"));
        assert!(context.ends_with("День тянулся."), "{context}");
        assert!(!context.contains("Вечером"));
        assert!(!context.contains("Утро"));
    }

    #[test]
    fn test_duplicate_contexts_are_dropped() {
        let compiled = entities(&[character("Вера", &[])]);
        let found = scan_mentions("<p>Вера и снова Вера.</p>", &compiled);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].matched, "Вера");
        assert_eq!(found[0].start, 0);
    }

    #[test]
    fn test_context_assembly_skips_repeats() {
        let compiled = entities(&[character("Вулич", &[])]);
        let found = scan_mentions(
            "<p>Глава</p><p>Глава</p><p>Вулич сел,– сказал он</p>",
            &compiled,
        );
        assert_eq!(found[0].context, "Глава Вулич сел, – сказал он");
    }

    #[test]
    fn test_collapse_repeats() {
        assert_eq!(collapse_repeats("a b a b c"), "a b c");
        assert_eq!(collapse_repeats("да да да"), "да");
        assert_eq!(collapse_repeats("Анна ушла"), "Анна ушла");

        // 超过上限的长序列不再比较
        let block: Vec<String> = (0..MAX_REPEAT_WORDS + 1).map(|i| format!("w{i}")).collect();
        let doubled = format!("{0} {0}", block.join(" "));
        assert_eq!(collapse_repeats(&doubled), doubled);
    }

    #[test]
    fn test_clean_text_for_storage() {
        assert_eq!(
            clean_text_for_storage("\u{feff}Текст\u{0}  с\u{fffd}\n мусором\u{7}"),
            "Текст с мусором"
        );
        let long = "а".repeat(MAX_STORED_CONTEXT_CHARS + 10);
        assert_eq!(
            clean_text_for_storage(&long).chars().count(),
            MAX_STORED_CONTEXT_CHARS
        );
    }
}
