//! Text normalization for abbreviation matching.
//!
//! Every scorer and query regex is expressed against the canonical forms
//! produced here, so identity of tokens rather than bytes drives matching.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Runs of dashes, underscores, dots, whitespace, and en/em dashes.
static DASH_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-_.\s\u{2013}\u{2014}]+").unwrap()
});

/// Parenthesized or bracketed segments, with any leading whitespace.
static PAREN_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\([^()]*\)|\s*\[[^\[\]]*\]").unwrap()
});

/// Whole-token words ignored when classifying skipped text and when
/// contracting names into keywords. Sorted for binary search.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "been", "can", "did", "do", "for",
    "has", "how", "if", "in", "is", "isnt", "it", "new", "of", "on", "or",
    "that", "the", "their", "they", "this", "to", "we", "were", "what",
    "which", "with", "you",
];

/// Collapse any run of `-`, `_`, `.`, whitespace, `–`, `—` to a single
/// ASCII space.
pub fn dedash(s: &str) -> String {
    DASH_RUN.replace_all(s, " ").into_owned()
}

/// NFD-decompose and drop combining marks, yielding an ASCII-ish form
/// ("café" → "cafe"). Recomposes so unaffected text stays in NFC.
pub fn deaccent(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Trim and collapse internal whitespace to single spaces.
pub fn simplify_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `s` contains an internal case or digit/letter boundary
/// suggestive of a camel-cased identifier (`R1`, `FooBar`, `OveMer`).
pub fn is_camel_word(s: &str) -> bool {
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if let Some(p) = prev {
            if (p.is_alphabetic() && (c.is_uppercase() || c.is_ascii_digit()))
                || (p.is_ascii_digit() && c.is_alphabetic())
            {
                return true;
            }
        }
        prev = Some(c);
    }
    false
}

/// Stricter camel test: requires a lowercase-then-uppercase transition or
/// an upper-upper-lower triplet ("OveMer", "FOOBar"; not "R1" or "FOO").
pub fn is_strict_camel_word(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    for i in 1..chars.len() {
        if chars[i - 1].is_lowercase() && chars[i].is_uppercase() {
            return true;
        }
        if i + 1 < chars.len()
            && chars[i - 1].is_uppercase()
            && chars[i].is_uppercase()
            && chars[i + 1].is_lowercase()
        {
            return true;
        }
    }
    false
}

/// Split a camel-cased word at case boundaries: before an uppercase that
/// follows a lowercase, and before the final uppercase of an acronym run
/// that is followed by lowercase ("FooBar" → "Foo Bar", "FOOBar" → "FOO Bar").
pub fn split_camel(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let p = chars[i - 1];
            let case_boundary = p.is_lowercase() && c.is_uppercase();
            let acronym_boundary = p.is_uppercase()
                && c.is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if case_boundary || acronym_boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Segment `s` into tokens over alphanumerics, leading underscores, tildes,
/// and `?`/`!`, joined by single spaces with a leading space prefix.
/// Quotes, brackets, and all other punctuation separate tokens and are
/// dropped. Returns `""` when no token is found.
pub fn make_xtester(s: &str) -> String {
    let mut out = String::new();
    let mut token = String::new();
    let mut only_underscores = true;
    for c in s.chars() {
        let token_char = c.is_alphanumeric()
            || c == '~'
            || c == '?'
            || c == '!'
            || (c == '_' && only_underscores);
        if token_char {
            if c != '_' {
                only_underscores = false;
            }
            token.push(c);
        } else if !token.is_empty() {
            out.push(' ');
            out.push_str(&token);
            token.clear();
            only_underscores = true;
        }
    }
    if !token.is_empty() {
        out.push(' ');
        out.push_str(&token);
    }
    out
}

/// Remove whole-token stop words from a tester string, case-insensitively.
/// Returns `""` when every token was a stop word.
pub fn xtester_remove_stops(s: &str) -> String {
    let mut out = String::new();
    for tok in s.split(' ').filter(|t| !t.is_empty()) {
        if !is_stop_word(tok) {
            out.push(' ');
            out.push_str(tok);
        }
    }
    out
}

/// Whole-word stop-word test, case-insensitive.
pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.binary_search(&lower.as_str()).is_ok()
}

/// Remove parenthesized and bracketed segments, then re-simplify
/// whitespace ("Paper (draft)" → "Paper").
pub fn strip_parenthesized(s: &str) -> String {
    simplify_whitespace(&PAREN_SEGMENT.replace_all(s, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── dedash / deaccent / whitespace ───────────────────────────

    #[test]
    fn test_dedash_collapses_runs() {
        assert_eq!(dedash("foo--bar__baz..qux"), "foo bar baz qux");
        assert_eq!(dedash("a \t b"), "a b");
        assert_eq!(dedash("en–dash—em"), "en dash em");
    }

    #[test]
    fn test_deaccent_strips_marks() {
        assert_eq!(deaccent("café"), "cafe");
        assert_eq!(deaccent("Überprüfung"), "Uberprufung");
        assert_eq!(deaccent("plain"), "plain");
    }

    #[test]
    fn test_simplify_whitespace() {
        assert_eq!(simplify_whitespace("  a\n b\t c  "), "a b c");
        assert_eq!(simplify_whitespace(""), "");
    }

    // ── camel detection ──────────────────────────────────────────

    #[test]
    fn test_is_camel_word() {
        assert!(is_camel_word("R1"));
        assert!(is_camel_word("FooBar"));
        assert!(is_camel_word("OveMer"));
        assert!(is_camel_word("paper2020"));
        assert!(!is_camel_word("overall"));
        assert!(!is_camel_word("Overall merit"));
    }

    #[test]
    fn test_is_strict_camel_word() {
        assert!(is_strict_camel_word("OveMer"));
        assert!(is_strict_camel_word("FOOBar"));
        assert!(!is_strict_camel_word("R1"));
        assert!(!is_strict_camel_word("FOO"));
        assert!(!is_strict_camel_word("merit"));
    }

    #[test]
    fn test_split_camel() {
        assert_eq!(split_camel("FooBar"), "Foo Bar");
        assert_eq!(split_camel("FOOBar"), "FOO Bar");
        assert_eq!(split_camel("OveMer"), "Ove Mer");
    }

    // ── tester construction ──────────────────────────────────────

    #[test]
    fn test_make_xtester_basic() {
        assert_eq!(make_xtester("overall merit"), " overall merit");
        assert_eq!(make_xtester("R1 Score"), " R1 Score");
    }

    #[test]
    fn test_make_xtester_drops_punctuation() {
        assert_eq!(make_xtester("paper (draft)"), " paper draft");
        assert_eq!(make_xtester("\"quoted\" [bracketed]"), " quoted bracketed");
    }

    #[test]
    fn test_make_xtester_leading_underscores() {
        assert_eq!(make_xtester("_private name"), " _private name");
        assert_eq!(make_xtester("snake_case"), " snake case");
    }

    #[test]
    fn test_make_xtester_empty() {
        assert_eq!(make_xtester("()"), "");
        assert_eq!(make_xtester(""), "");
    }

    // ── stop words ───────────────────────────────────────────────

    #[test]
    fn test_stop_words_case_insensitive() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("The"));
        assert!(is_stop_word("ISNT"));
        assert!(!is_stop_word("merit"));
    }

    #[test]
    fn test_xtester_remove_stops() {
        assert_eq!(
            xtester_remove_stops(" a study of the new systems"),
            " study systems"
        );
        assert_eq!(xtester_remove_stops(" of the"), "");
    }

    // ── deparenthesization ───────────────────────────────────────

    #[test]
    fn test_strip_parenthesized() {
        assert_eq!(strip_parenthesized("Paper (draft)"), "Paper");
        assert_eq!(strip_parenthesized("Score [hidden] total"), "Score total");
        assert_eq!(strip_parenthesized("No parens"), "No parens");
    }
}
