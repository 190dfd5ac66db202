//! Name Patterns - 名字匹配模式生成
//!
//! 基于手写的俄语词干/词尾规则，为人物的每个名字形式生成不区分大小写的正则。

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use uuid::Uuid;

use super::Character;

/// 名字中需要去掉的引号
const QUOTE_CHARS: &[char] = &['\'', '"', '`', '«', '»'];

/// 生成模式时视为辅音结尾的字母
const PATTERN_CONSONANTS: &str = "бвгджзклмнпрстфхцчшщ";

/// 生成词形变化时视为辅音结尾的字母（含 й、ъ、ь）
const INFLECTION_CONSONANTS: &str = "бвгджзйклмнпрстфхцчшщъь";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("人物没有可用的名字: {0}")]
    EmptyName(Uuid),

    #[error("名字模式编译失败 '{form}': {source}")]
    Compile {
        form: String,
        #[source]
        source: regex::Error,
    },
}

/// 去掉引号和首尾空白
pub fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// 单个词的模式（不含边界）
pub fn single_name_pattern(token: &str) -> String {
    let literal = regex::escape(token);
    if token.chars().count() < 3 {
        return literal;
    }
    let Some((split, last)) = token.char_indices().next_back() else {
        return literal;
    };

    let stem = regex::escape(&token[..split]);
    let last = last.to_lowercase().next().unwrap_or(last);

    match last {
        c if PATTERN_CONSONANTS.contains(c) => {
            format!("({stem}[аеиоуыэюя]{{0,2}}|{literal}(а|у|ом|е|ы)?)")
        }
        'а' => format!("({stem}[еиую]|{stem}ой|{literal}|{stem}[еи]н)"),
        'я' => format!("({stem}е|{stem}ей|{stem}ю|{stem}и|{literal})"),
        _ => literal,
    }
}

/// 完整名字的模式：多词名字逐词生成后以 `\s+` 连接，整体加单词边界
pub fn generate_name_pattern(name: &str) -> String {
    let body = name
        .split_whitespace()
        .map(single_name_pattern)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!(r"\b{body}\b")
}

/// 简单的格变化：辅音 +а/+у/+ом/+е；-а → ы/е/у/ой；-я → и/е/ю/ей
pub fn name_inflections(name: &str) -> Vec<String> {
    let mut forms = vec![name.to_string()];
    let Some((split, last)) = name.char_indices().next_back() else {
        return forms;
    };
    let stem = &name[..split];
    let last = last.to_lowercase().next().unwrap_or(last);

    match last {
        c if INFLECTION_CONSONANTS.contains(c) => {
            forms.extend(["а", "у", "ом", "е"].iter().map(|e| format!("{name}{e}")))
        }
        'а' => forms.extend(["ы", "е", "у", "ой"].iter().map(|e| format!("{stem}{e}"))),
        'я' => forms.extend(["и", "е", "ю", "ей"].iter().map(|e| format!("{stem}{e}"))),
        _ => {}
    }
    forms
}

/// 人物的全部表面形式：名字形式及其变格，按大小写去重
pub fn surface_forms(character: &Character) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut forms = Vec::new();

    for form in character.name_forms() {
        for inflected in name_inflections(&form) {
            let key = inflected.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                forms.push(inflected);
            }
        }
    }

    forms
}

/// 一个表面形式及其编译后的正则
#[derive(Debug, Clone)]
pub struct NamePattern {
    pub source: String,
    pub regex: Regex,
}

/// 一个人物的全部模式，按来源形式长度降序
#[derive(Debug, Clone)]
pub struct EntityPatterns {
    character_id: Uuid,
    patterns: Vec<NamePattern>,
}

impl EntityPatterns {
    pub fn compile(character: &Character) -> Result<Self, PatternError> {
        let forms = surface_forms(character);
        if forms.is_empty() {
            return Err(PatternError::EmptyName(character.id()));
        }

        let mut patterns = forms
            .into_iter()
            .map(|form| {
                RegexBuilder::new(&generate_name_pattern(&form))
                    .case_insensitive(true)
                    .build()
                    .map(|regex| NamePattern {
                        source: form.clone(),
                        regex,
                    })
                    .map_err(|source| PatternError::Compile { form, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        patterns.sort_by_key(|p| std::cmp::Reverse(p.source.chars().count()));

        Ok(Self {
            character_id: character.id(),
            patterns,
        })
    }

    pub fn character_id(&self) -> Uuid {
        self.character_id
    }

    pub fn patterns(&self) -> &[NamePattern] {
        &self.patterns
    }
}

/// 为一组人物编译模式，编译失败的人物记录日志后跳过
pub fn compile_all(characters: &[Character]) -> Vec<EntityPatterns> {
    characters
        .iter()
        .filter_map(|character| match EntityPatterns::compile(character) {
            Ok(patterns) => Some(patterns),
            Err(e) => {
                tracing::warn!(
                    character_id = %character.id(),
                    name = %character.name(),
                    error = %e,
                    "Skipping character with unusable name patterns"
                );
                None
            }
        })
        .collect()
}

/// 跨人物合并后的模式序列中的一项
#[derive(Debug, Clone, Copy)]
pub struct RankedPattern<'a> {
    pub character_id: Uuid,
    pub pattern: &'a NamePattern,
}

/// 把所有人物的模式按来源形式长度降序排成一列（稳定排序）
pub fn rank_patterns(entities: &[EntityPatterns]) -> Vec<RankedPattern<'_>> {
    let mut ranked: Vec<_> = entities
        .iter()
        .flat_map(|entity| {
            entity.patterns.iter().map(move |pattern| RankedPattern {
                character_id: entity.character_id,
                pattern,
            })
        })
        .collect();
    ranked.sort_by_key(|r| std::cmp::Reverse(r.pattern.source.chars().count()));
    ranked
}
