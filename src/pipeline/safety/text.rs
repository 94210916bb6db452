//! Text preparation shared by the validator and completeness checks.

use crate::pipeline::normalize::fields::fold_diacritics;

/// Lowercase, strip diacritics, replace anything outside `[a-z0-9 /-]`
/// with a space and collapse whitespace.
pub fn matching_form(text: &str) -> String {
    let folded = fold_diacritics(&text.to_lowercase());
    let mapped: String = folded
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '/' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase and diacritic-folded, punctuation kept. Used where codes such
/// as `i21.0` must survive.
pub fn folded_lower(text: &str) -> String {
    fold_diacritics(&text.to_lowercase())
}

/// Whitespace tokens of the folded text with outer punctuation trimmed,
/// keeping inner `.`, `:` and `-` so codes stay whole.
pub fn code_tokens(text: &str) -> Vec<String> {
    folded_lower(text)
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word windows of `min..=max` words as `(start, end)` index pairs.
pub fn ngram_spans(word_count: usize, min: usize, max: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    for n in min.max(1)..=max {
        if n > word_count {
            break;
        }
        for start in 0..=(word_count - n) {
            spans.push((start, start + n));
        }
    }
    spans
}

/// Set of n-gram strings over a matching-form text.
pub fn ngrams(text: &str, min: usize, max: usize) -> Vec<String> {
    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    let mut seen = std::collections::BTreeSet::new();
    ngram_spans(words.len(), min, max)
        .into_iter()
        .map(|(s, e)| words[s..e].join(" "))
        .filter(|g| seen.insert(g.clone()))
        .collect()
}

fn is_boundary(c: Option<char>) -> bool {
    matches!(c, None | Some(' ') | Some('/') | Some('-'))
}

/// Byte offset of the first occurrence of `needle` in `hay` that sits on
/// word boundaries (space, `/`, `-` or either end).
pub fn find_phrase(hay: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    hay.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before = hay[..i].chars().next_back();
        let after = hay[i + needle.len()..].chars().next();
        is_boundary(before) && is_boundary(after)
    })
}

pub fn contains_phrase(hay: &str, needle: &str) -> bool {
    find_phrase(hay, needle).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_form_folds_and_filters() {
        assert_eq!(
            matching_form("Neumonía (J18.9), tratada con Amoxicilina!"),
            "neumonia j18 9 tratada con amoxicilina"
        );
        assert_eq!(matching_form("  TAC/RX  post-operatorio "), "tac/rx post-operatorio");
    }

    #[test]
    fn code_tokens_keep_inner_punctuation() {
        assert_eq!(
            code_tokens("Dx: (J18.9), ATC:J01CA04; PROC-01."),
            vec!["dx", "j18.9", "atc:j01ca04", "proc-01"]
        );
    }

    #[test]
    fn ngram_spans_cover_all_windows() {
        let spans = ngram_spans(4, 2, 6);
        assert_eq!(spans, vec![(0, 2), (1, 3), (2, 4), (0, 3), (1, 4), (0, 4)]);
        assert!(ngram_spans(1, 2, 6).is_empty());
    }

    #[test]
    fn ngrams_are_unique() {
        let grams = ngrams("a b a b", 2, 2);
        assert_eq!(grams, vec!["a b", "b a"]);
    }

    #[test]
    fn phrase_match_respects_word_boundaries() {
        assert!(contains_phrase("neumonia adquirida en la comunidad", "adquirida en"));
        assert!(contains_phrase("tac/rx", "rx"));
        assert!(!contains_phrase("anemia", "emia"));
        assert!(!contains_phrase("", "x"));
        assert_eq!(find_phrase("rx de rx", "rx"), Some(0));
    }
}
