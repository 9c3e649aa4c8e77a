//! Keyword synthesis: the shortest unambiguous short form for an entry.
//!
//! Candidates are tried against the live index, so a synthesized keyword
//! is unique by construction. With `KW_ENSURE`, a numbered alias is
//! installed when no natural candidate is free.

use crate::entry::{EntryId, KW_CAMEL, KW_CLASS_MASK, KW_DASH, KW_ENSURE};
use crate::matcher::AbbreviationMatcher;
use crate::text::{make_xtester, strip_parenthesized, xtester_remove_stops};

impl<T: Clone + PartialEq> AbbreviationMatcher<T> {
    /// Produce a short keyword that resolves unambiguously to `id` under
    /// the given tag mask, shaped by `kwflags` (`KW_CAMEL`, `KW_DASH`, or
    /// `KW_UNDERSCORE`, plus `KW_ENSURE`). Returns `None` when no natural
    /// candidate is unique and `KW_ENSURE` was not requested.
    pub fn find_entry_keyword(
        &mut self,
        id: EntryId,
        kwflags: u32,
        tflags: u32,
    ) -> Option<String> {
        let target = self.resolve_root(id.0);
        let mut base = self.entry_name(id).to_string();

        // Prefer the name with parenthesized tails stripped, when every
        // match for the shortened form still resolves here.
        let stripped = strip_parenthesized(&base);
        if stripped != base && !stripped.is_empty() && self.tests_unique(&stripped, target, tflags)
        {
            base = stripped;
        }

        let tester = make_xtester(&base);
        let mut tokens: Vec<String> = tester
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if tokens.is_empty() {
            return None;
        }

        // Shed stop words when enough words carry the meaning on their own.
        if tokens.len() > 2 {
            let kept: Vec<String> = xtester_remove_stops(&tester)
                .split(' ')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if !kept.is_empty() && kept.len() != tokens.len() {
                let phrase = kept.join(" ");
                if self.tests_unique(&phrase, target, tflags) {
                    tokens = kept;
                }
            }
        }

        let ensure = kwflags & KW_ENSURE != 0;
        let class = kwflags & KW_CLASS_MASK;
        let candidates = if class == KW_CAMEL {
            camel_candidates(&tokens)
        } else {
            let sep = if class == KW_DASH { "-" } else { "_" };
            vec![joined_candidate(&tokens, sep)]
        };

        for cand in &candidates {
            if cand.is_empty() {
                continue;
            }
            if self.tests_unique(cand, target, tflags) {
                if ensure && class == KW_CAMEL && tokens.len() > 1 {
                    self.ensure_lowercase_alias(cand, target);
                }
                return Some(cand.clone());
            }
        }

        if !ensure {
            return None;
        }

        // No natural candidate is free: number the primary candidate until
        // a fresh form either resolves here or matches nothing, installing
        // it in the latter case. The resolve check keeps repeated calls
        // stable after the alias exists.
        let base_cand = candidates.iter().find(|c| !c.is_empty())?.clone();
        let mut n = 1u32;
        loop {
            let cand = format!("{base_cand}.{n}");
            let found = self.find_entries(&cand, tflags);
            if found.is_empty() {
                self.add_keyword_alias(&cand, target);
                return Some(cand);
            }
            if self.resolves_to(&found, target) {
                return Some(cand);
            }
            n += 1;
        }
    }

    /// Like [`find_entry_keyword`](Self::find_entry_keyword) with
    /// `KW_ENSURE` set; always yields a keyword for a named entry.
    pub fn ensure_entry_keyword(&mut self, id: EntryId, kwflags: u32, tflags: u32) -> String {
        self.find_entry_keyword(id, kwflags | KW_ENSURE, tflags)
            .expect("keyword synthesis with KW_ENSURE requires a tokenizable name")
    }

    /// True when `pattern` matches something and everything it matches
    /// resolves to `target`.
    fn tests_unique(&mut self, pattern: &str, target: usize, tflags: u32) -> bool {
        let found = self.find_entries(pattern, tflags);
        !found.is_empty() && self.resolves_to(&found, target)
    }

    fn resolves_to(&mut self, found: &[EntryId], target: usize) -> bool {
        for &f in found {
            let root = self.resolve_root(f.0);
            if root == target {
                continue;
            }
            let v = self.value(EntryId(root)).clone();
            if v != *self.value(EntryId(target)) {
                return false;
            }
        }
        true
    }

    /// Install the lowercased form of a multi-word camel keyword so later
    /// queries for it short-circuit to this entry.
    fn ensure_lowercase_alias(&mut self, cand: &str, target: usize) {
        let lower = cand.to_lowercase();
        let exists = self
            .entries
            .iter()
            .any(|e| e.is_keyword() && e.name.to_lowercase() == lower);
        if !exists {
            self.add_keyword_alias(&lower, target);
        }
    }
}

/// Camel candidates: the full contraction of every token, then (for long
/// names) windows of three tokens advancing one token at a time. The
/// window order is deliberate and not necessarily lexicographically
/// earliest.
fn camel_candidates(tokens: &[String]) -> Vec<String> {
    if tokens.len() == 1 {
        let t = &tokens[0];
        let keep = if t.chars().count() < 7 { 6 } else { 3 };
        return vec![title_case(&t.chars().take(keep).collect::<String>())];
    }
    let mut cands = vec![contract(tokens)];
    if tokens.len() > 3 {
        for start in 0..=tokens.len() - 3 {
            cands.push(contract(&tokens[start..start + 3]));
        }
    }
    cands
}

/// Title-case each token's first three letters and concatenate, keeping
/// an underscore where consecutive digit tokens would otherwise merge.
fn contract(tokens: &[String]) -> String {
    let mut out = String::new();
    for t in tokens {
        let piece = title_case(&t.chars().take(3).collect::<String>());
        if let (Some(last), Some(first)) = (out.chars().last(), piece.chars().next()) {
            if last.is_ascii_digit() && first.is_ascii_digit() {
                out.push('_');
            }
        }
        out.push_str(&piece);
    }
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase tokens joined with a separator, restricted to alphanumerics.
fn joined_candidate(tokens: &[String], sep: &str) -> String {
    tokens
        .iter()
        .map(|t| {
            t.to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    // ── candidate construction ───────────────────────────────────

    #[test]
    fn test_contract_three_letters_per_word() {
        assert_eq!(contract(&toks(&["overall", "merit"])), "OveMer");
        assert_eq!(contract(&toks(&["study", "new", "systems"])), "StuNewSys");
    }

    #[test]
    fn test_contract_short_words_kept_whole() {
        assert_eq!(contract(&toks(&["a", "b"])), "AB");
    }

    #[test]
    fn test_contract_digit_separator() {
        assert_eq!(contract(&toks(&["r1", "2"])), "R1_2");
        assert_eq!(contract(&toks(&["round", "2"])), "Rou2");
    }

    #[test]
    fn test_single_short_word_keeps_six() {
        assert_eq!(camel_candidates(&toks(&["merit"])), vec!["Merit"]);
        assert_eq!(camel_candidates(&toks(&["review"])), vec!["Review"]);
        assert_eq!(camel_candidates(&toks(&["quality"])), vec!["Qua"]);
    }

    #[test]
    fn test_windows_advance_by_one() {
        let cands = camel_candidates(&toks(&["alpha", "beta", "gamma", "delta"]));
        assert_eq!(
            cands,
            vec!["AlpBetGamDel", "AlpBetGam", "BetGamDel"]
        );
    }

    #[test]
    fn test_joined_candidates() {
        assert_eq!(joined_candidate(&toks(&["Overall", "Merit"]), "-"), "overall-merit");
        assert_eq!(joined_candidate(&toks(&["Overall", "Merit"]), "_"), "overall_merit");
    }
}
