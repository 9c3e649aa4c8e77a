//! Legacy word-order scorer: the match-class ladder.
//!
//! Ranks how closely a pattern matches a candidate name on an integer
//! ladder with fractional refinement. Higher is better; fractional tiers
//! subtract demerits for partial and out-of-order matches.
//!
//! | Class | Meaning                                              |
//! |-------|------------------------------------------------------|
//! | 9     | Pattern equals name exactly                          |
//! | 8     | Dedashed pattern equals dedashed name                |
//! | 7     | Case-insensitive equality of dedashed forms          |
//! | 6+f   | Word match, fractional quality `f` in (0, 1]         |
//! | 5     | Accent-folded equality                               |
//! | 4     | Dedashed accent-folded equality                      |
//! | 3     | Case-insensitive dedashed accent-folded equality     |
//! | 1+f   | Word-or-camel match on folded forms                  |
//! | 0     | No match                                             |
//!
//! This scorer exists as a cross-check for the regex scorer in
//! `query.rs`; release builds without the `cross-check` feature never
//! invoke it.

use regex::Regex;

use crate::text::{deaccent, dedash, is_camel_word, simplify_whitespace};

/// One demerit is worth 1/64 of a class point.
const DEMERIT_UNIT: f64 = 0.015625;

/// A candidate name as seen by both scorers.
pub(crate) struct Subject<'a> {
    pub(crate) name: &'a str,
    pub(crate) dedash_name: &'a str,
    pub(crate) ltester: &'a str,
    pub(crate) keyword: bool,
}

/// A scorer ranks one pattern against every analyzed entry and returns
/// the positions tied at the best score.
pub(crate) trait Scorer {
    fn best_positions(&self, subjects: &[Subject<'_>]) -> Vec<usize>;
}

/// One pattern word, with its wildcard automaton when the word contains
/// `*`.
struct PatternWord {
    text: String,
    wildcard: Option<Regex>,
}

impl PatternWord {
    fn new(text: &str) -> Self {
        let wildcard = if text.contains('*') {
            let body = text
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            Regex::new(&format!("^{}$", body)).ok()
        } else {
            None
        };
        Self {
            text: text.to_string(),
            wildcard,
        }
    }
}

/// One camel atom; `adjacent` is true when the next atom continues the
/// same pattern word and may therefore consume from the same subject word.
struct CamelAtom {
    text: String,
    adjacent: bool,
}

/// Pre-computed canonical forms of one query pattern.
pub(crate) struct RankPattern {
    exact: String,
    dedashed: String,
    dedash_lower: String,
    folded: String,
    folded_dedash: String,
    folded_dedash_lower: String,
    words_exact: Vec<PatternWord>,
    words_folded: Vec<PatternWord>,
    camel_atoms: Option<Vec<CamelAtom>>,
    any_wildcard: bool,
    leading_wildcard: bool,
}

impl RankPattern {
    pub(crate) fn new(pattern: &str) -> Self {
        let exact = simplify_whitespace(pattern);
        let dedashed = dedash(&exact);
        let dedash_lower = dedashed.to_lowercase();
        let folded = deaccent(&exact);
        let folded_dedash = dedash(&folded);
        let folded_dedash_lower = folded_dedash.to_lowercase();
        let words_exact = parse_words(&dedash_lower);
        let words_folded = parse_words(&folded_dedash_lower);
        let camel_atoms = if is_camel_word(&folded) {
            Some(parse_camel_atoms(&folded))
        } else {
            None
        };
        Self {
            any_wildcard: exact.contains('*'),
            leading_wildcard: exact.starts_with('*'),
            exact,
            dedashed,
            dedash_lower,
            folded,
            folded_dedash,
            folded_dedash_lower,
            words_exact,
            words_folded,
            camel_atoms,
        }
    }
}

fn parse_words(s: &str) -> Vec<PatternWord> {
    s.split(' ')
        .filter(|w| !w.is_empty())
        .map(PatternWord::new)
        .collect()
}

/// Split a camel pattern into atoms `[a-z]+`, `[A-Z][a-z]*`, `[0-9]+`.
/// Wildcards attach to the atom they follow (or lead). Atoms are
/// lowercased; the last atom of each pattern word is not `adjacent`.
fn parse_camel_atoms(s: &str) -> Vec<CamelAtom> {
    let mut atoms: Vec<CamelAtom> = Vec::new();
    for word in s.split_whitespace() {
        let start = atoms.len();
        let chars: Vec<char> = word.chars().collect();
        let mut pending = String::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let mut text = String::new();
            if c.is_ascii_digit() {
                while i < chars.len() && chars[i].is_ascii_digit() {
                    text.push(chars[i]);
                    i += 1;
                }
            } else if c.is_uppercase() {
                text.push(c);
                i += 1;
                while i < chars.len() && chars[i].is_lowercase() {
                    text.push(chars[i]);
                    i += 1;
                }
            } else if c.is_lowercase() {
                while i < chars.len() && chars[i].is_lowercase() {
                    text.push(chars[i]);
                    i += 1;
                }
            } else {
                if c == '*' {
                    if atoms.len() > start {
                        if let Some(last) = atoms.last_mut() {
                            last.text.push('*');
                        }
                    } else {
                        pending.push('*');
                    }
                }
                i += 1;
                continue;
            }
            atoms.push(CamelAtom {
                text: format!("{}{}", pending, text.to_lowercase()),
                adjacent: true,
            });
            pending.clear();
        }
        if atoms.len() > start {
            if let Some(last) = atoms.last_mut() {
                last.adjacent = false;
            }
        }
    }
    atoms
}

fn demerit_fraction(demerits: u32) -> f64 {
    1.0 - DEMERIT_UNIT * (demerits + 1).min(63) as f64
}

enum WordFit {
    Full,
    Partial,
}

fn word_fit(word: &PatternWord, subject: &str) -> Option<WordFit> {
    if word.text.contains('*') {
        return word
            .wildcard
            .as_ref()
            .filter(|re| re.is_match(subject))
            .map(|_| WordFit::Partial);
    }
    if subject == word.text {
        Some(WordFit::Full)
    } else if subject.starts_with(&word.text) {
        Some(WordFit::Partial)
    } else {
        None
    }
}

/// Left-to-right word consumption. Pattern words consume subject words in
/// order; an unmatched subject word before a later match counts as
/// skipped. Returns accumulated demerits, or `None` when some pattern
/// word finds no subject word.
fn word_match(
    words: &[PatternWord],
    subject: &[&str],
    leading_wildcard: bool,
    any_wildcard: bool,
) -> Option<u32> {
    if words.is_empty() {
        return None;
    }
    let mut wi = 0;
    let mut skipped = false;
    let mut demerits = 0u32;
    for w in words {
        loop {
            if wi >= subject.len() {
                return None;
            }
            match word_fit(w, subject[wi]) {
                Some(WordFit::Full) => {
                    wi += 1;
                    break;
                }
                Some(WordFit::Partial) => {
                    demerits += 1;
                    wi += 1;
                    break;
                }
                None => {
                    wi += 1;
                    skipped = true;
                }
            }
        }
    }
    if skipped && !leading_wildcard {
        demerits += 4;
    }
    if wi < subject.len() && !any_wildcard {
        demerits += 4;
    }
    Some(demerits)
}

/// Match an atom at the start of `rest`, returning the unconsumed tail.
/// A `*` consumes up to the next literal segment; a trailing `*` consumes
/// the remainder of the word.
fn strip_atom<'s>(atom: &str, rest: &'s str) -> Option<&'s str> {
    if !atom.contains('*') {
        return rest.strip_prefix(atom);
    }
    let mut segs = atom.split('*');
    let first = segs.next().unwrap_or("");
    let mut cur = rest.strip_prefix(first)?;
    for seg in segs {
        if seg.is_empty() {
            cur = "";
            continue;
        }
        match cur.find(seg) {
            Some(p) => cur = &cur[p + seg.len()..],
            None => return None,
        }
    }
    Some(cur)
}

/// Camel consumption: subject words are consumed one at a time, and
/// within one subject word consecutive adjacent atoms may consume
/// substrings in order.
fn camel_match(
    atoms: &[CamelAtom],
    subject: &[&str],
    leading_wildcard: bool,
    any_wildcard: bool,
) -> Option<u32> {
    if atoms.is_empty() {
        return None;
    }
    let mut wi = 0usize;
    let mut rest: Option<&str> = None;
    let mut word_wildcard = false;
    let mut skipped = false;
    let mut demerits = 0u32;
    let mut prev_adjacent = false;
    for atom in atoms {
        let mut matched = false;
        if prev_adjacent {
            if let Some(r) = rest {
                if let Some(tail) = strip_atom(&atom.text, r) {
                    rest = Some(tail);
                    word_wildcard |= atom.text.contains('*');
                    matched = true;
                }
            }
        }
        if !matched {
            if let Some(r) = rest.take() {
                if !r.is_empty() || word_wildcard {
                    demerits += 1;
                }
                wi += 1;
                word_wildcard = false;
            }
            loop {
                if wi >= subject.len() {
                    return None;
                }
                if let Some(tail) = strip_atom(&atom.text, subject[wi]) {
                    rest = Some(tail);
                    word_wildcard = atom.text.contains('*');
                    break;
                }
                wi += 1;
                skipped = true;
            }
        }
        prev_adjacent = atom.adjacent;
    }
    if let Some(r) = rest.take() {
        if !r.is_empty() || word_wildcard {
            demerits += 1;
        }
        wi += 1;
    }
    if skipped && !leading_wildcard {
        demerits += 4;
    }
    if wi < subject.len() && !any_wildcard {
        demerits += 4;
    }
    Some(demerits)
}

/// Walk the ladder for one candidate name.
pub(crate) fn compute_match_class(pat: &RankPattern, name: &str, dedash_name: &str) -> f64 {
    if pat.exact == name {
        return 9.0;
    }
    if pat.dedashed == dedash_name {
        return 8.0;
    }
    let dd_lower = dedash_name.to_lowercase();
    if pat.dedash_lower == dd_lower {
        return 7.0;
    }
    let subject_words: Vec<&str> = dd_lower.split(' ').filter(|w| !w.is_empty()).collect();
    if let Some(d) = word_match(
        &pat.words_exact,
        &subject_words,
        pat.leading_wildcard,
        pat.any_wildcard,
    ) {
        return 6.0 + demerit_fraction(d);
    }
    let folded_name = deaccent(name);
    if pat.folded == folded_name {
        return 5.0;
    }
    let folded_dd = deaccent(dedash_name);
    if pat.folded_dedash == folded_dd {
        return 4.0;
    }
    let folded_dd_lower = folded_dd.to_lowercase();
    if pat.folded_dedash_lower == folded_dd_lower {
        return 3.0;
    }
    let folded_words: Vec<&str> = folded_dd_lower
        .split(' ')
        .filter(|w| !w.is_empty())
        .collect();
    let mut fit = word_match(
        &pat.words_folded,
        &folded_words,
        pat.leading_wildcard,
        pat.any_wildcard,
    );
    if let Some(atoms) = &pat.camel_atoms {
        let camel = camel_match(atoms, &folded_words, pat.leading_wildcard, pat.any_wildcard);
        fit = match (fit, camel) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
    }
    if let Some(d) = fit {
        return 1.0 + demerit_fraction(d);
    }
    0.0
}

impl Scorer for RankPattern {
    fn best_positions(&self, subjects: &[Subject<'_>]) -> Vec<usize> {
        let mut best = 0.0f64;
        let mut out = Vec::new();
        for (i, s) in subjects.iter().enumerate() {
            let class = compute_match_class(self, s.name, s.dedash_name);
            if class <= 0.0 {
                continue;
            }
            match class.total_cmp(&best) {
                std::cmp::Ordering::Greater => {
                    best = class;
                    out.clear();
                    out.push(i);
                }
                std::cmp::Ordering::Equal => out.push(i),
                std::cmp::Ordering::Less => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(pattern: &str, name: &str) -> f64 {
        let pat = RankPattern::new(pattern);
        compute_match_class(&pat, name, &dedash(name))
    }

    // ── exact tiers ──────────────────────────────────────────────

    #[test]
    fn test_exact_match() {
        assert_eq!(class("Overall merit", "Overall merit"), 9.0);
    }

    #[test]
    fn test_dedash_match() {
        assert_eq!(class("Overall-merit", "Overall merit"), 8.0);
    }

    #[test]
    fn test_case_insensitive_dedash_match() {
        assert_eq!(class("overall merit", "Overall merit"), 7.0);
    }

    // ── folded tiers ─────────────────────────────────────────────

    #[test]
    fn test_folded_match() {
        assert_eq!(class("cafe", "café"), 5.0);
    }

    #[test]
    fn test_folded_dedash_match() {
        assert_eq!(class("cafe noir", "café-noir"), 4.0);
    }

    #[test]
    fn test_folded_case_insensitive_match() {
        assert_eq!(class("CAFE-noir", "café-Noir"), 3.0);
    }

    // ── word tier ────────────────────────────────────────────────

    #[test]
    fn test_word_prefix_demerits() {
        // Two partial words: demerits 2, fraction 1 - 3/64.
        let c = class("ove mer", "Overall merit");
        assert_eq!(c, 6.0 + (1.0 - 3.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_word_trailing_extras_demerit() {
        // "overall" leaves "merit" unmatched: full match + 4 extras.
        let c = class("overall", "Overall merit");
        assert_eq!(c, 6.0 + (1.0 - 5.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_word_skip_demerit() {
        // "merit" skips "overall": full word match + 4 skip.
        let c = class("merit", "Overall merit");
        assert_eq!(c, 6.0 + (1.0 - 5.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_trailing_wildcard_waives_extras() {
        let c = class("ove*", "Overall merit");
        assert_eq!(c, 6.0 + (1.0 - 2.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_leading_wildcard_waives_skip() {
        let c = class("*merit", "Overall merit");
        assert_eq!(c, 6.0 + (1.0 - 2.0 * DEMERIT_UNIT));
    }

    // ── camel tier ───────────────────────────────────────────────

    #[test]
    fn test_camel_match() {
        // Two partial words, no skips: demerits 2.
        let c = class("OveMer", "Overall merit");
        assert_eq!(c, 1.0 + (1.0 - 3.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_camel_no_match() {
        assert_eq!(class("OveMer", "Other field"), 0.0);
    }

    #[test]
    fn test_camel_digit_atoms() {
        // Atoms r/1/sc; "score" consumed partially, nothing skipped.
        let c = class("R1Sc", "R1 Score");
        assert_eq!(c, 1.0 + (1.0 - 2.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_digit_pattern_word_tier() {
        // "r1" matches its word exactly; "score" left over costs 4.
        let c = class("R1", "R1 Score");
        assert_eq!(c, 6.0 + (1.0 - 5.0 * DEMERIT_UNIT));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(class("zzz", "Overall merit"), 0.0);
    }

    // ── tracker ──────────────────────────────────────────────────

    #[test]
    fn test_best_positions_keeps_ties() {
        let pat = RankPattern::new("overall");
        let names = ["Overall merit", "Overall review quality", "Other"];
        let dedashes: Vec<String> = names.iter().map(|n| dedash(n)).collect();
        let subjects: Vec<Subject<'_>> = names
            .iter()
            .zip(&dedashes)
            .map(|(n, d)| Subject {
                name: n,
                dedash_name: d,
                ltester: "",
                keyword: false,
            })
            .collect();
        assert_eq!(pat.best_positions(&subjects), vec![0, 1]);
    }
}
