//! 答案文本解析 - 业务能力层
//!
//! 纯文本算法：在一段原始文字中找到"正确答案"标注，取出其后的选项字母。
//! 同时服务于 PDF 文本层和 OCR 两条路径。

use std::sync::OnceLock;

use phf::phf_map;
use regex::Regex;

use crate::models::AnswerLetter;

/// 无标注时，整段文字短于该长度才视为"只有一个字母"
const SHORT_TEXT_LIMIT: usize = 10;

/// "正确答案" / "答案" 的常见写法（已去除空格），包含 hamza 与 taa marbuta 的变体
pub const ANSWER_MARKERS: &[&str] = &[
    "الإجابةالصحيحة",
    "الاجابةالصحيحة",
    "الإجابهالصحيحه",
    "الاجابهالصحيحه",
    "الإجابةالصحيحه",
    "الاجابةالصحيحه",
    "الجوابالصحيح",
    "الإجابة",
    "الاجابة",
    "الإجابه",
    "الاجابه",
    "الجواب",
];

/// 选项字母别名 → 标准字母（含 OCR 易混淆的拉丁字母）
static LETTER_ALIASES: phf::Map<char, AnswerLetter> = phf_map! {
    'أ' => AnswerLetter::Alef,
    'ا' => AnswerLetter::Alef,
    'إ' => AnswerLetter::Alef,
    'آ' => AnswerLetter::Alef,
    'A' => AnswerLetter::Alef,
    'a' => AnswerLetter::Alef,
    'ب' => AnswerLetter::Beh,
    'B' => AnswerLetter::Beh,
    'b' => AnswerLetter::Beh,
    'ج' => AnswerLetter::Jeem,
    'C' => AnswerLetter::Jeem,
    'c' => AnswerLetter::Jeem,
    'د' => AnswerLetter::Dal,
    'D' => AnswerLetter::Dal,
    'd' => AnswerLetter::Dal,
};

fn noise_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[\s\x{200B}-\x{200F}\x{202A}-\x{202E}\x{2066}-\x{2069}\x{FEFF}\x{0640}_.\-]+")
            .expect("valid noise pattern")
    })
}

/// 去掉空白、零宽/双向控制符、下划线、连字符、句点和延长线
pub fn clean_text(raw: &str) -> String {
    noise_pattern().replace_all(raw, "").into_owned()
}

/// 单个字符 → 标准选项字母
pub fn normalize(c: char) -> Option<AnswerLetter> {
    LETTER_ALIASES.get(&c).copied()
}

/// 找到起决定作用的标注：最后一次出现位置最靠右者胜出，位置相同取更长的标注
///
/// 返回 (起始字节位置, 标注)
pub fn governing_marker<'a>(clean: &str, markers: &[&'a str]) -> Option<(usize, &'a str)> {
    markers
        .iter()
        .filter_map(|marker| clean.rfind(marker).map(|index| (index, *marker)))
        .max_by(|(a_index, a_marker), (b_index, b_marker)| {
            a_index
                .cmp(b_index)
                .then_with(|| a_marker.len().cmp(&b_marker.len()))
        })
}

/// 不带 hamza 的 alef 也是普通单词里的常见字母，不能作为"第一个字母"直接采纳
fn is_bare_alef(c: char) -> bool {
    matches!(c, 'ا' | 'إ' | 'آ')
}

/// 先取第一个明确的字母；找不到时，末尾的单独 alef 才算答案
fn first_letter(candidate: &str) -> Option<AnswerLetter> {
    candidate
        .chars()
        .filter(|c| !is_bare_alef(*c))
        .find_map(normalize)
        .or_else(|| {
            candidate
                .chars()
                .filter(|c| c.is_alphabetic())
                .last()
                .and_then(normalize)
        })
}

/// 从原始文字中提取答案字母
pub fn extract(raw: &str) -> Option<AnswerLetter> {
    let clean = clean_text(raw);
    if clean.is_empty() {
        return None;
    }

    if let Some((index, marker)) = governing_marker(&clean, ANSWER_MARKERS) {
        return first_letter(&clean[index + marker.len()..]);
    }

    if clean.chars().count() < SHORT_TEXT_LIMIT {
        return first_letter(&clean);
    }

    None
}

/// OCR 字符白名单：所有字母别名、易与字母混淆的 `0` / `o`、以及标注中出现的字符
pub fn ocr_whitelist() -> String {
    let mut chars: Vec<char> = Vec::new();
    let mut push = |c: char| {
        if !chars.contains(&c) {
            chars.push(c);
        }
    };

    for letter in AnswerLetter::ALL {
        push(letter.as_char());
    }
    let mut aliases: Vec<char> = LETTER_ALIASES.keys().copied().collect();
    aliases.sort_unstable();
    aliases.into_iter().for_each(&mut push);
    push('0');
    push('o');
    for marker in ANSWER_MARKERS {
        marker.chars().for_each(&mut push);
    }
    push(':');

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_caption() {
        assert_eq!(extract("الإجابة الصحيحة: ب"), Some(AnswerLetter::Beh));
        assert_eq!(extract("الاجابة الصحيحة هي (د)"), Some(AnswerLetter::Dal));
    }

    #[test]
    fn test_alef_inside_words_is_not_an_answer() {
        assert_eq!(
            extract("الإجابة الصحيحة هي الخيار ب"),
            Some(AnswerLetter::Beh)
        );
        assert_eq!(
            extract("الإجابة الصحيحة لهذا السؤال: د"),
            Some(AnswerLetter::Dal)
        );
        assert_eq!(extract("الإجابة الصحيحة: ا"), Some(AnswerLetter::Alef));
        assert_eq!(extract("الإجابة الصحيحة هي ا"), Some(AnswerLetter::Alef));
        assert_eq!(extract("الإجابة الصحيحة هي الخيار"), None);
    }

    #[test]
    fn test_marker_followed_by_each_alias() {
        for (alias, letter) in LETTER_ALIASES.entries() {
            for marker in ANSWER_MARKERS {
                let text = format!("{}{}", marker, alias);
                assert_eq!(extract(&text), Some(*letter), "文本: {}", text);
            }
        }
    }

    #[test]
    fn test_longer_marker_wins_tie() {
        let clean = clean_text("الإجابة الصحيحة: ج");
        let (index, marker) = governing_marker(&clean, ANSWER_MARKERS).unwrap();
        assert_eq!(index, 0);
        assert_eq!(marker, "الإجابةالصحيحة");
        assert_eq!(extract("الإجابة الصحيحة: ج"), Some(AnswerLetter::Jeem));
    }

    #[test]
    fn test_rightmost_marker_governs() {
        // 前面是较长的标注，后面是较短的标注，后者决定答案
        let raw = "الإجابة الصحيحة د ثم الجواب ب";
        assert_eq!(extract(raw), Some(AnswerLetter::Beh));

        let clean = clean_text(raw);
        let (index, marker) = governing_marker(&clean, ANSWER_MARKERS).unwrap();
        assert_eq!(marker, "الجواب");
        assert!(index > 0);
    }

    #[test]
    fn test_short_text_without_marker() {
        assert_eq!(extract(" ب "), Some(AnswerLetter::Beh));
        assert_eq!(extract("(C)"), Some(AnswerLetter::Jeem));
        assert_eq!(extract("d."), Some(AnswerLetter::Dal));
    }

    #[test]
    fn test_long_text_without_marker_is_none() {
        assert_eq!(extract("هذا نص طويل بدون أي علامة هنا"), None);
    }

    #[test]
    fn test_marker_without_letter_is_none() {
        assert_eq!(extract("الإجابة الصحيحة: ؟"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("  \u{200F} "), None);
    }

    #[test]
    fn test_clean_text_strips_noise() {
        assert_eq!(clean_text("a _b-\u{200B}c.\u{202B}d ـ"), "abcd");
    }

    #[test]
    fn test_normalize_is_total_over_aliases() {
        for c in ['أ', 'ا', 'إ', 'آ', 'A', 'a'] {
            assert_eq!(normalize(c), Some(AnswerLetter::Alef));
        }
        for c in ['ب', 'B', 'b'] {
            assert_eq!(normalize(c), Some(AnswerLetter::Beh));
        }
        for c in ['ج', 'C', 'c'] {
            assert_eq!(normalize(c), Some(AnswerLetter::Jeem));
        }
        for c in ['د', 'D', 'd'] {
            assert_eq!(normalize(c), Some(AnswerLetter::Dal));
        }
        for c in ['ه', 'E', '0', 'o', ':', ' '] {
            assert_eq!(normalize(c), None);
        }
    }

    #[test]
    fn test_ocr_whitelist_covers_letters_and_markers() {
        let whitelist = ocr_whitelist();
        for c in "أبجدABCDabcd0o".chars() {
            assert!(whitelist.contains(c), "缺少字符 {}", c);
        }
        for marker in ANSWER_MARKERS {
            assert!(marker.chars().all(|c| whitelist.contains(c)));
        }
        let unique: std::collections::HashSet<char> = whitelist.chars().collect();
        assert_eq!(unique.len(), whitelist.chars().count());
    }
}
