//! Compiled query for the primary scorer.
//!
//! A pattern is deaccented and segmented into atoms, which compile into a
//! regex scanned over each entry's tester string. When several entries
//! survive the scan, a capturing variant of the same regex classifies each
//! survivor by how much of the tester its atoms skipped, and only the
//! best class is kept.
//!
//! A trailing numeric atom must stop at a digit boundary ("R1" must not
//! match "R100"). The regex engine has no lookahead, so the compiled
//! query appends `(?:[^0-9]|$)` and treats the extra character as part of
//! the unmatched tail.

use regex::Regex;
use tracing::debug;

use crate::ranking::{Scorer, Subject};
use crate::text::{deaccent, is_camel_word, is_stop_word};

/// One pattern atom: lowercased text with `*` retained.
struct QueryAtom {
    text: String,
    numeric: bool,
}

/// A query pattern compiled for scanning tester strings.
pub(crate) struct CompiledQuery {
    lpattern: String,
    multiword: bool,
    wildcard: bool,
    leading_wildcard: bool,
    digit_guard: bool,
    n_atoms: usize,
    regex: Option<Regex>,
    capture_regex: Option<Regex>,
}

impl CompiledQuery {
    pub(crate) fn new(pattern: &str) -> Self {
        let folded = deaccent(pattern);
        let lpattern = folded.to_lowercase();
        let camel = is_camel_word(&folded);
        let atoms = split_atoms(&folded, camel);
        let digit_guard = atoms
            .last()
            .is_some_and(|a| a.numeric && !a.text.contains('*'));
        let (regex, capture_regex) = build_regexes(&atoms, camel, digit_guard);
        Self {
            multiword: folded.trim().contains(char::is_whitespace),
            wildcard: folded.contains('*'),
            leading_wildcard: folded.trim_start().starts_with('*'),
            digit_guard,
            n_atoms: atoms.len(),
            lpattern,
            regex,
            capture_regex,
        }
    }

    pub(crate) fn leading_wildcard(&self) -> bool {
        self.leading_wildcard
    }

    /// Pre-filter: whole-lowercased-name equality for space-free patterns,
    /// else the compiled regex anywhere in the tester.
    pub(crate) fn matches(&self, tester: &str) -> bool {
        if !self.multiword {
            if let Some(body) = tester.strip_prefix(' ') {
                if body == self.lpattern {
                    return true;
                }
            }
        }
        self.regex.as_ref().is_some_and(|re| re.is_match(tester))
    }

    /// Classify one surviving tester.
    ///
    /// Without a wildcard: 3 when the match covers the full tester with no
    /// skipped tokens and every gap starting on a word boundary; 2 when
    /// every skipped token is a stop word and the entry is not a keyword;
    /// 1 when every atom stopped on a word boundary and the entry is not a
    /// keyword; else 0. With a wildcard: 1 when every skipped token is a
    /// stop word, else 0.
    pub(crate) fn status(&self, tester: &str, keyword: bool) -> u8 {
        if !self.multiword {
            if let Some(body) = tester.strip_prefix(' ') {
                if body == self.lpattern {
                    return 3;
                }
            }
        }
        let Some(re) = &self.capture_regex else {
            return 0;
        };
        let Some(caps) = re.captures(tester) else {
            return 0;
        };
        let Some(full) = caps.get(0) else {
            return 0;
        };
        let match_start = full.start();
        let match_end = if self.digit_guard {
            caps.get(self.n_atoms).map_or(full.end(), |g| g.start())
        } else {
            full.end()
        };

        let mut skipped: Vec<&str> = Vec::new();
        let mut clean = true;

        // Words wholly before the match count as skipped.
        skipped.extend(tester[..match_start].split(' ').filter(|w| !w.is_empty()));

        // A gap with a non-empty first piece means the previous atom
        // stopped mid-word; later pieces are whole skipped words.
        for gi in 1..self.n_atoms {
            let gap = caps.get(gi).map_or("", |g| g.as_str());
            if gap.is_empty() {
                continue;
            }
            let mut pieces = gap.split(' ');
            if !pieces.next().unwrap_or("").is_empty() {
                clean = false;
            }
            skipped.extend(pieces.filter(|w| !w.is_empty()));
        }

        // The trailing unmatched tail counts as skipped tokens.
        let tail = &tester[match_end..];
        if !tail.is_empty() {
            let mut pieces = tail.split(' ');
            if !pieces.next().unwrap_or("").is_empty() {
                clean = false;
            }
            skipped.extend(pieces.filter(|w| !w.is_empty()));
        }

        if self.wildcard {
            return u8::from(skipped.iter().all(|w| is_stop_word(w)));
        }

        let full_cover = match_start == 0 && match_end == tester.len();
        if skipped.is_empty() && clean && full_cover {
            3
        } else if !keyword && skipped.iter().all(|w| is_stop_word(w)) {
            2
        } else if !keyword && clean {
            1
        } else {
            0
        }
    }
}

impl Scorer for CompiledQuery {
    fn best_positions(&self, subjects: &[Subject<'_>]) -> Vec<usize> {
        let mut found: Vec<usize> = subjects
            .iter()
            .enumerate()
            .filter(|(_, s)| self.matches(s.ltester))
            .map(|(i, _)| i)
            .collect();
        if found.len() > 1 && !self.leading_wildcard {
            let statuses: Vec<u8> = found
                .iter()
                .map(|&i| self.status(subjects[i].ltester, subjects[i].keyword))
                .collect();
            let best = statuses.iter().copied().max().unwrap_or(0);
            found = found
                .into_iter()
                .zip(statuses)
                .filter(|&(_, st)| st == best)
                .map(|(i, _)| i)
                .collect();
        }
        found
    }
}

/// Segment a deaccented pattern into atoms.
///
/// Camel patterns split at case and digit boundaries (`[A-Za-z~][a-z~?!]*`,
/// `[A-Z]+` as independent single letters, `[0-9.]+`); other patterns
/// split into letter runs and numeric runs. Wildcards attach to the atom
/// they follow, or prefix the next one.
fn split_atoms(s: &str, camel: bool) -> Vec<QueryAtom> {
    let chars: Vec<char> = s.chars().collect();
    let mut atoms: Vec<QueryAtom> = Vec::new();
    let mut pending = String::new();
    let mut adjacent = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() || c == '.' {
            let mut text = String::new();
            let mut has_digit = false;
            while i < chars.len()
                && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '*')
            {
                has_digit |= chars[i].is_ascii_digit();
                text.push(chars[i]);
                i += 1;
            }
            if has_digit {
                push_atom(&mut atoms, &mut pending, text);
                adjacent = true;
            } else {
                // Dots without digits separate; keep any wildcard.
                if text.contains('*') {
                    pending.push('*');
                }
                adjacent = false;
            }
        } else if c.is_alphabetic() || c == '~' || (!camel && (c == '?' || c == '!')) {
            if camel && c.is_uppercase() {
                let mut j = i;
                while j < chars.len() && chars[j].is_uppercase() {
                    j += 1;
                }
                let followed_by_lower = j < chars.len() && chars[j].is_lowercase();
                let mut run_end = j;
                if run_end - i >= 2 && followed_by_lower {
                    run_end -= 1;
                }
                if run_end - i >= 2 || !(run_end < chars.len() && chars[run_end].is_lowercase())
                {
                    // A run of uppercase letters becomes independent
                    // single-letter atoms.
                    for k in i..run_end {
                        push_atom(&mut atoms, &mut pending, chars[k].to_string());
                    }
                    i = run_end;
                } else {
                    let mut text = chars[i].to_string();
                    i += 1;
                    while i < chars.len() && is_camel_tail(chars[i]) {
                        text.push(chars[i]);
                        i += 1;
                    }
                    push_atom(&mut atoms, &mut pending, text);
                }
            } else if camel {
                let mut text = String::new();
                while i < chars.len() && is_camel_tail(chars[i]) {
                    text.push(chars[i]);
                    i += 1;
                }
                push_atom(&mut atoms, &mut pending, text);
            } else {
                let mut text = String::new();
                while i < chars.len()
                    && (chars[i].is_alphabetic()
                        || matches!(chars[i], '~' | '?' | '!' | '*'))
                {
                    text.push(chars[i]);
                    i += 1;
                }
                push_atom(&mut atoms, &mut pending, text);
            }
            adjacent = true;
        } else if c == '*' {
            if adjacent {
                if let Some(last) = atoms.last_mut() {
                    last.text.push('*');
                }
            } else {
                pending.push('*');
            }
            i += 1;
        } else {
            adjacent = false;
            i += 1;
        }
    }
    atoms
}

fn is_camel_tail(c: char) -> bool {
    (c.is_lowercase() && c.is_alphabetic()) || matches!(c, '~' | '?' | '!' | '*')
}

fn push_atom(atoms: &mut Vec<QueryAtom>, pending: &mut String, text: String) {
    let text = format!("{}{}", pending, text.to_lowercase());
    pending.clear();
    let numeric = text.chars().all(|c| c.is_ascii_digit() || c == '.');
    atoms.push(QueryAtom { text, numeric });
}

fn atom_pattern(a: &QueryAtom) -> String {
    a.text
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

fn build_regexes(
    atoms: &[QueryAtom],
    camel: bool,
    digit_guard: bool,
) -> (Option<Regex>, Option<Regex>) {
    if atoms.is_empty() {
        return (None, None);
    }
    let parts: Vec<String> = atoms.iter().map(atom_pattern).collect();
    let joiner = if camel { "(?:.*? )??" } else { ".*? " };
    let cap_joiner = if camel { "((?:.*? )??)" } else { "(.*? )" };
    let mut plain = format!(" {}", parts.join(joiner));
    let mut capture = format!(" {}", parts.join(cap_joiner));
    if digit_guard {
        plain.push_str("(?:[^0-9]|$)");
        capture.push_str("([^0-9]|$)");
    }
    let compile = |src: &str| match Regex::new(src) {
        Ok(re) => Some(re),
        Err(err) => {
            debug!(regex = src, error = %err, "query regex failed to compile");
            None
        }
    };
    (compile(&plain), compile(&capture))
}
