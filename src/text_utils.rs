use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

/// Lowercase, trim and collapse inner whitespace so two spellings of the same
/// phrase compare equal. Trailing punctuation is dropped.
pub fn normalize_for_match(text: &str) -> String {
    let lowered = text
        .trim()
        .trim_end_matches(['.', '!', '?', '…', ')'])
        .to_lowercase()
        .replace('ё', "е");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive prefix strip that only matches on a word boundary.
///
/// Returns the remainder with separators (`:`, `,`, `-`, whitespace) trimmed
/// from the front.
pub fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let text = text.trim_start();
    let mut rest = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let remainder = match rest.next() {
        None => "",
        Some((idx, c)) if c.is_whitespace() || matches!(c, ':' | ',' | '-' | '—') => &text[idx..],
        Some(_) => return None,
    };
    let trimmed = remainder.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '-' | '—'));
    trace!(?prefix, ?trimmed, "Stripped prefix");
    Some(trimmed.trim_end())
}

/// True if the text contains an explicit list separator.
pub fn looks_like_list(text: &str) -> bool {
    text.contains([',', ';', '\n'])
}

/// Number of comma/semicolon separated entries, ignoring blanks.
pub fn count_items(products: &str) -> usize {
    products
        .split([',', ';', '\n'])
        .filter(|item| !item.trim().is_empty())
        .count()
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shortens a button label to `max` graphemes, ending with an ellipsis.
pub fn truncate_label(label: &str, max: usize) -> String {
    let graphemes: Vec<&str> = label.graphemes(true).collect();
    if graphemes.len() <= max {
        return label.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = graphemes[..keep].concat();
    out.push('…');
    out
}

/// Splits a long message on paragraph, then line boundaries so each chunk
/// holds at most `max` characters. Tags never span paragraphs in our output.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if line_len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(max).map(|c| c.iter().collect::<String>()));
            continue;
        }
        if current.chars().count() + line_len > max {
            let cut = current.rfind("\n\n").map(|i| i + 2).unwrap_or(current.len());
            let tail = current.split_off(cut);
            if current.is_empty() {
                chunks.push(tail);
            } else {
                chunks.push(current);
                current = tail;
            }
            if current.chars().count() + line_len > max {
                chunks.push(std::mem::take(&mut current));
            }
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_folds_case_and_yo() {
        assert_eq!(normalize_for_match("  Ещё   Вариант! "), "еще вариант");
    }

    #[test]
    fn strip_prefix_requires_word_boundary() {
        assert_eq!(strip_prefix_ci("Дай рецепт: борщ", "дай рецепт"), Some("борщ"));
        assert_eq!(strip_prefix_ci("рецепт", "рецепт"), Some(""));
        assert_eq!(strip_prefix_ci("рецептура борща", "рецепт"), None);
        assert_eq!(strip_prefix_ci("add cheese", "add"), Some("cheese"));
        assert_eq!(strip_prefix_ci("ad", "add"), None);
    }

    #[test]
    fn count_items_ignores_blanks() {
        assert_eq!(count_items("курица, рис,, лук;"), 3);
        assert_eq!(count_items(""), 0);
    }

    #[test]
    fn truncate_label_keeps_graphemes() {
        assert_eq!(truncate_label("Плов", 10), "Плов");
        assert_eq!(truncate_label("Плов по-узбекски", 5), "Плов…");
        assert_eq!(truncate_label("👨‍🍳👨‍🍳👨‍🍳", 2), "👨‍🍳…");
    }

    proptest! {
        #[test]
        fn prop_truncate_label_bounded(s in "\\PC{0,40}", max in 1usize..20) {
            let out = truncate_label(&s, max);
            prop_assert!(out.graphemes(true).count() <= max.max(1));
        }
    }

    #[test]
    fn short_message_is_one_chunk() {
        assert_eq!(split_message("Плов\n\nРис", 4096), vec!["Плов\n\nРис"]);
    }

    #[test]
    fn long_message_splits_on_paragraphs() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(6), "b".repeat(6), "c".repeat(6));
        let chunks = split_message(&text, 16);
        assert_eq!(chunks, vec![format!("{}\n\n{}", "a".repeat(6), "b".repeat(6)), "c".repeat(6)]);
    }

    #[test]
    fn oversized_line_is_hard_wrapped() {
        let chunks = split_message(&"x".repeat(25), 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }
}
