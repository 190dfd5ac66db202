//! Ordinal Extraction - 从标题中解析章节序号
//!
//! 支持俄语序数词（1-12 的全部格变化）、罗马数字、阿拉伯数字，
//! 以及常见的 OCR / 键盘布局错字。

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// 已知错字 → 正确写法
const TYPO_CORRECTIONS: &[(&str, &str)] = &[
    // 拉丁字母 b/t 混入词干，词尾保留
    ("btор", "втор"),
    ("bтор", "втор"),
    // 拉丁字母 e
    ("дeйствие", "действие"),
    ("tom", "том"),
    ("4асть", "часть"),
    ("тертье", "третье"),
];

/// 硬词尾形容词型序数词的词干
const HARD_STEMS: &[(&str, u32)] = &[
    ("перв", 1),
    ("втор", 2),
    ("четверт", 4),
    ("пят", 5),
    ("шест", 6),
    ("седьм", 7),
    ("восьм", 8),
    ("девят", 9),
    ("десят", 10),
    ("одиннадцат", 11),
    ("двенадцат", 12),
];

const HARD_ENDINGS: &[&str] = &[
    "ый", "ой", "ая", "ое", "ые", "ого", "ому", "ым", "ом", "ую", "ых", "ыми",
];

/// "третий" 是软词尾，单独列出
const THIRD_FORMS: &[&str] = &[
    "третий", "третья", "третье", "третьи", "третьего", "третьему", "третьим", "третьем",
    "третью", "третьей", "третьих", "третьими",
];

static ORDINAL_WORDS: LazyLock<HashMap<String, u32>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (stem, value) in HARD_STEMS {
        for ending in HARD_ENDINGS {
            map.insert(format!("{stem}{ending}"), *value);
        }
    }
    for form in THIRD_FORMS {
        map.insert((*form).to_string(), 3);
    }
    map
});

static KEYWORD_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(том|часть|действие|сцена|явление|глава)[\s\-]+([а-я]+)")
        .expect("static regex")
});

static KEYWORD_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(том|часть|действие|сцена|явление|глава)[\s\-]+([ivxlcdm]+|[0-9]+)\b")
        .expect("static regex")
});

static BARE_NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ivxlcdm]+|[0-9]+)$").expect("static regex"));

/// 小写、ё→е、修正已知错字
pub fn normalize_for_numbering(title: &str) -> String {
    let mut text = title.trim().to_lowercase().replace('ё', "е");
    for (wrong, correct) in TYPO_CORRECTIONS {
        if text.contains(wrong) {
            text = text.replace(wrong, correct);
        }
    }
    text
}

/// 序数词 → 数值（只接受完整词形）
pub fn ordinal_word_value(word: &str) -> Option<u32> {
    ORDINAL_WORDS.get(&word.to_lowercase().replace('ё', "е")).copied()
}

pub fn is_roman_numeral(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}

/// 罗马数字转整数（减法记法）；含非法字符返回 0
pub fn roman_to_int(text: &str) -> u32 {
    fn value(c: char) -> Option<u32> {
        match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    }

    let Some(values) = text.chars().map(value).collect::<Option<Vec<u32>>>() else {
        return 0;
    };

    let mut total: i64 = 0;
    let mut prev = 0;
    for v in values.into_iter().rev() {
        if v < prev {
            total -= v as i64;
        } else {
            total += v as i64;
        }
        prev = v;
    }
    total.max(0) as u32
}

fn numeral_value(token: &str) -> Option<u32> {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    match roman_to_int(token) {
        0 => None,
        n => Some(n),
    }
}

/// 从标题中提取序号，无法识别时返回 None
///
/// 依次尝试:
/// 1. 关键词 + 序数词（"Глава вторая"）
/// 2. 关键词 + 罗马/阿拉伯数字（"Часть III"、"Глава 5"）
/// 3. 只有数字的标题（"XII"、"7"）
pub fn extract_number(title: &str) -> Option<u32> {
    let text = normalize_for_numbering(title);

    if let Some(caps) = KEYWORD_WORD.captures(&text) {
        if let Some(n) = ordinal_word_value(&caps[2]) {
            return Some(n);
        }
    }

    if let Some(caps) = KEYWORD_NUMERAL.captures(&text) {
        if let Some(n) = numeral_value(&caps[2]) {
            return Some(n);
        }
    }

    if let Some(caps) = BARE_NUMERAL.captures(&text) {
        if let Some(n) = numeral_value(&caps[1]) {
            return Some(n);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_words_in_titles() {
        assert_eq!(extract_number("Глава вторая"), Some(2));
        assert_eq!(extract_number("Часть первая"), Some(1));
        assert_eq!(extract_number("Действие третье"), Some(3));
        assert_eq!(extract_number("Том Двенадцатый"), Some(12));
        assert_eq!(extract_number("Глава четвёртая"), Some(4));
    }

    #[test]
    fn test_numerals_in_titles() {
        assert_eq!(extract_number("Часть III"), Some(3));
        assert_eq!(extract_number("Глава 5. Бал"), Some(5));
        assert_eq!(extract_number("XIV"), Some(14));
        assert_eq!(extract_number("7"), Some(7));
    }

    #[test]
    fn test_typo_corrections() {
        assert_eq!(extract_number("Часть btорая"), Some(2));
        assert_eq!(extract_number("Часть bторая"), Some(2));
        assert_eq!(extract_number("Глава bторой"), Some(2));
        assert_eq!(normalize_for_numbering("Часть bторая"), "часть вторая");
        assert_eq!(extract_number("4асть первая"), Some(1));
        assert_eq!(extract_number("Действие тертье"), Some(3));
        assert_eq!(extract_number("Tom 2"), Some(2));
    }

    #[test]
    fn test_unrecognized_titles() {
        assert_eq!(extract_number("Бэла"), None);
        assert_eq!(extract_number("Глава последняя"), None);
        assert_eq!(extract_number("Потом 5"), None);
    }

    #[test]
    fn test_word_prefix_is_not_an_ordinal() {
        // "пятница" 以 "пят" 开头，但不是序数词
        assert_eq!(ordinal_word_value("пятница"), None);
        assert_eq!(ordinal_word_value("пятая"), Some(5));
    }

    #[test]
    fn test_roman_to_int() {
        assert_eq!(roman_to_int("IV"), 4);
        assert_eq!(roman_to_int("ix"), 9);
        assert_eq!(roman_to_int("MCMXC"), 1990);
        assert_eq!(roman_to_int("XIIA"), 0);
        assert_eq!(roman_to_int(""), 0);
    }

    #[test]
    fn test_is_roman_numeral() {
        assert!(is_roman_numeral("xii"));
        assert!(!is_roman_numeral("глава"));
        assert!(!is_roman_numeral(""));
    }
}
