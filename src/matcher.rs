//! The abbreviation index.
//!
//! An append-only list of named entries with two memoized scorers over
//! it. Queries take `&mut self`: the first query after an append analyzes
//! pending entries (tester strings, dedashed names), and every query may
//! grow the per-pattern result caches. Callers serialize access.

use std::collections::HashMap;

use tracing::warn;

use crate::entry::{Entry, EntryId, Payload, TFLAG_KW, TFLAG_PRIO_MASK};
use crate::query::CompiledQuery;
use crate::ranking::{RankPattern, Scorer, Subject};
use crate::text::{
    deaccent, dedash, is_strict_camel_word, make_xtester, simplify_whitespace, split_camel,
    strip_parenthesized,
};

/// Searchable index from short patterns to registered named entries.
///
/// Phrases and keywords accumulate through `add_*`; `find_*` returns the
/// best-matching subset under the tiered similarity model. Payloads are
/// deduplicated by identity, falling back to equality.
pub struct AbbreviationMatcher<T> {
    pub(crate) entries: Vec<Entry<T>>,
    /// Lowercased tester strings, parallel to `entries` up to `n_analyzed`.
    ltesters: Vec<String>,
    n_analyzed: usize,
    n_deparenthesized: usize,
    /// Priority tier (low 8 tag bits) → priority; higher wins.
    priorities: HashMap<u32, f64>,
    /// Legacy scorer memoization, pattern → tied-best entry positions.
    matches: HashMap<String, Vec<usize>>,
    /// Primary scorer memoization.
    xmatches: HashMap<String, Vec<usize>>,
}

impl<T> Default for AbbreviationMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration operations.
impl<T> AbbreviationMatcher<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ltesters: Vec::new(),
            n_analyzed: 0,
            n_deparenthesized: 0,
            priorities: HashMap::new(),
            matches: HashMap::new(),
            xmatches: HashMap::new(),
        }
    }

    pub fn nentries(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_name(&self, id: EntryId) -> &str {
        &self.entries[id.0].name
    }

    pub fn entry_tflags(&self, id: EntryId) -> u32 {
        self.entries[id.0].tflags
    }

    /// Register a phrase. The name is accent-folded and whitespace
    /// simplified; a single strict-camel name also registers its
    /// space-split form as an alias ("FooBar" → "Foo Bar").
    pub fn add_phrase(&mut self, name: &str, value: T, tflags: u32) -> EntryId {
        self.add_phrase_payload(name, Payload::Eager(value), tflags)
    }

    /// Register a phrase whose value is produced on first use.
    pub fn add_phrase_lazy(
        &mut self,
        name: &str,
        loader: impl FnOnce() -> T + 'static,
        tflags: u32,
    ) -> EntryId {
        self.add_phrase_payload(name, Payload::Lazy(Some(Box::new(loader))), tflags)
    }

    fn add_phrase_payload(&mut self, name: &str, payload: Payload<T>, tflags: u32) -> EntryId {
        let name = simplify_whitespace(&deaccent(name));
        let camel_split = if !name.contains(' ') && is_strict_camel_word(&name) {
            Some(split_camel(&name))
        } else {
            None
        };
        let id = EntryId(self.entries.len());
        self.entries.push(Entry::new(name, payload, tflags));
        if let Some(split) = camel_split {
            self.entries
                .push(Entry::new(split, Payload::Alias(id.0), tflags));
        }
        self.matches.clear();
        self.xmatches.clear();
        id
    }

    /// Register a keyword: a single token matched by exact lowercased
    /// equality ahead of phrase matching.
    ///
    /// # Panics
    ///
    /// Panics when `name` contains whitespace.
    pub fn add_keyword(&mut self, name: &str, value: T, tflags: u32) -> EntryId {
        self.add_keyword_payload(name, Payload::Eager(value), tflags)
    }

    /// Register a keyword whose value is produced on first use.
    pub fn add_keyword_lazy(
        &mut self,
        name: &str,
        loader: impl FnOnce() -> T + 'static,
        tflags: u32,
    ) -> EntryId {
        self.add_keyword_payload(name, Payload::Lazy(Some(Box::new(loader))), tflags)
    }

    fn add_keyword_payload(&mut self, name: &str, payload: Payload<T>, tflags: u32) -> EntryId {
        assert!(
            !name.chars().any(char::is_whitespace),
            "keyword name must not contain whitespace: {name:?}"
        );
        let id = EntryId(self.entries.len());
        self.entries
            .push(Entry::new(name.to_string(), payload, tflags | TFLAG_KW));
        self.purge_keyword_caches(name);
        id
    }

    /// Append a keyword aliasing an existing entry's payload.
    pub(crate) fn add_keyword_alias(&mut self, name: &str, target: usize) {
        let tflags = self.entries[target].tflags | TFLAG_KW;
        self.add_keyword_payload(name, Payload::Alias(target), tflags);
    }

    /// A keyword addition only disturbs queries for its own lowercased
    /// form; every other cached result stays valid.
    fn purge_keyword_caches(&mut self, name: &str) {
        let lower = deaccent(name).to_lowercase();
        self.matches
            .retain(|k, _| deaccent(k).to_lowercase() != lower);
        self.xmatches
            .retain(|k, _| deaccent(k).to_lowercase() != lower);
    }

    /// Record a priority for the tier named by the low 8 bits of
    /// `tflags`. Higher priorities displace lower ones in query results.
    pub fn set_priority(&mut self, tflags: u32, prio: f64) {
        self.priorities.insert(tflags & TFLAG_PRIO_MASK, prio);
    }

    /// For every phrase entry not yet processed, register an alias with
    /// parenthesized and bracketed segments stripped, when the stripped
    /// name is non-empty and its tester is new to the index.
    pub fn add_deparenthesized(&mut self) {
        self.analyze();
        let end = self.entries.len();
        let mut added = false;
        for i in self.n_deparenthesized..end {
            if self.entries[i].is_keyword() {
                continue;
            }
            let stripped = strip_parenthesized(&self.entries[i].name);
            if stripped.is_empty() || stripped == self.entries[i].name {
                continue;
            }
            let tester = make_xtester(&stripped.to_lowercase());
            if tester.is_empty() || self.ltesters.iter().any(|t| *t == tester) {
                continue;
            }
            let root = self.resolve_root(i);
            let tflags = self.entries[i].tflags;
            self.push_analyzed(Entry::new(stripped, Payload::Alias(root), tflags), tester);
            added = true;
        }
        self.n_deparenthesized = self.entries.len();
        if added {
            self.matches.clear();
            self.xmatches.clear();
        }
    }

    /// Append an entry whose tester is already known, keeping the
    /// analysis high-water mark tight.
    fn push_analyzed(&mut self, mut entry: Entry<T>, tester: String) {
        debug_assert_eq!(self.n_analyzed, self.entries.len());
        entry.dedash_name = dedash(&entry.name).trim().to_string();
        self.entries.push(entry);
        self.ltesters.push(tester);
        self.n_analyzed = self.entries.len();
    }

    /// Compute derived fields for entries appended since the last query.
    fn analyze(&mut self) {
        while self.n_analyzed < self.entries.len() {
            let entry = &mut self.entries[self.n_analyzed];
            entry.dedash_name = dedash(&entry.name).trim().to_string();
            let tester = if entry.is_keyword() {
                format!(" {}", deaccent(&entry.name).to_lowercase())
            } else {
                make_xtester(&deaccent(&entry.name).to_lowercase())
            };
            self.ltesters.push(tester);
            self.n_analyzed += 1;
        }
    }

    pub(crate) fn resolve_root(&self, mut i: usize) -> usize {
        while let Payload::Alias(next) = &self.entries[i].payload {
            i = *next;
        }
        i
    }

    /// Resolve a handle's payload, materializing a lazy loader at most
    /// once per underlying value.
    pub fn value(&mut self, id: EntryId) -> &T {
        let root = self.resolve_root(id.0);
        if matches!(self.entries[root].payload, Payload::Lazy(_)) {
            let loader = match &mut self.entries[root].payload {
                Payload::Lazy(slot) => slot.take(),
                _ => None,
            };
            let loader =
                loader.unwrap_or_else(|| panic!("lazy loader for entry {root} already taken"));
            self.entries[root].payload = Payload::Eager(loader());
        }
        match &self.entries[root].payload {
            Payload::Eager(v) => v,
            _ => panic!("entry {root} has no materialized value"),
        }
    }

    fn subjects(&self) -> Vec<Subject<'_>> {
        self.entries
            .iter()
            .zip(&self.ltesters)
            .map(|(e, t)| Subject {
                name: &e.name,
                dedash_name: &e.dedash_name,
                ltester: t,
                keyword: e.is_keyword(),
            })
            .collect()
    }

    fn xfind_positions(&mut self, pattern: &str) -> Vec<usize> {
        if let Some(hit) = self.xmatches.get(pattern) {
            return hit.clone();
        }
        self.analyze();
        let query = CompiledQuery::new(pattern);
        let found = query.best_positions(&self.subjects());
        self.xmatches.insert(pattern.to_string(), found.clone());
        found
    }

    fn rank_positions(&mut self, pattern: &str) -> Vec<usize> {
        if let Some(hit) = self.matches.get(pattern) {
            return hit.clone();
        }
        self.analyze();
        let ranker = RankPattern::new(pattern);
        let found = ranker.best_positions(&self.subjects());
        self.matches.insert(pattern.to_string(), found.clone());
        found
    }

    fn priority_of(&self, i: usize) -> f64 {
        self.priorities
            .get(&(self.entries[i].tflags & TFLAG_PRIO_MASK))
            .copied()
            .unwrap_or(0.0)
    }

    /// Keep entries intersecting the caller's mask, then keep only those
    /// at the highest observed priority. A priority recorded for the mask
    /// itself acts as a floor.
    fn filter_positions(&self, positions: &[usize], tflags: u32) -> Vec<usize> {
        let mut kept: Vec<usize> = positions
            .iter()
            .copied()
            .filter(|&i| tflags == 0 || self.entries[i].tflags & tflags != 0)
            .collect();
        if kept.is_empty() {
            return kept;
        }
        let mut best = f64::NEG_INFINITY;
        for &i in &kept {
            best = best.max(self.priority_of(i));
        }
        if tflags != 0 {
            if let Some(&floor) = self.priorities.get(&(tflags & TFLAG_PRIO_MASK)) {
                best = best.max(floor);
            }
        }
        kept.retain(|&i| self.priority_of(i).total_cmp(&best).is_eq());
        kept
    }

    /// Entries best matching `pattern`, filtered by tag mask and
    /// priority. An empty result means no match.
    pub fn find_entries(&mut self, pattern: &str, tflags: u32) -> Vec<EntryId> {
        let positions = self.xfind_positions(pattern);
        self.filter_positions(&positions, tflags)
            .into_iter()
            .map(EntryId)
            .collect()
    }
}

/// Value-returning queries.
impl<T: Clone + PartialEq> AbbreviationMatcher<T> {
    /// Deduplicate by payload identity (alias root), then by equality.
    fn dedup_values(&mut self, positions: &[usize]) -> Vec<T> {
        let mut roots: Vec<usize> = Vec::new();
        let mut out: Vec<T> = Vec::new();
        for &i in positions {
            let root = self.resolve_root(i);
            if roots.contains(&root) {
                continue;
            }
            roots.push(root);
            let v = self.value(EntryId(root)).clone();
            if !out.contains(&v) {
                out.push(v);
            }
        }
        out
    }

    /// Best-matching values for `pattern`, deduplicated.
    pub fn find_all(&mut self, pattern: &str, tflags: u32) -> Vec<T> {
        let positions = self.xfind_positions(pattern);
        let kept = self.filter_positions(&positions, tflags);
        let values = self.dedup_values(&kept);
        if cfg!(any(debug_assertions, feature = "cross-check")) {
            self.cross_check(pattern, tflags, &kept, &values);
        }
        values
    }

    /// Run the legacy scorer on the same pattern and log a diagnostic
    /// when the compressed result sets differ. The primary result stands.
    fn cross_check(&mut self, pattern: &str, tflags: u32, primary_kept: &[usize], primary: &[T]) {
        let positions = self.rank_positions(pattern);
        let kept = self.filter_positions(&positions, tflags);
        let legacy = self.dedup_values(&kept);
        if legacy != *primary {
            let primary_names: Vec<&str> = primary_kept
                .iter()
                .map(|&i| self.entries[i].name.as_str())
                .collect();
            let legacy_names: Vec<&str> =
                kept.iter().map(|&i| self.entries[i].name.as_str()).collect();
            warn!(
                pattern,
                primary = ?primary_names,
                legacy = ?legacy_names,
                "abbreviation scorers diverged"
            );
        }
    }

    /// The single best-matching value, or `None` when the match is
    /// missing or ambiguous.
    pub fn find1(&mut self, pattern: &str, tflags: u32) -> Option<T> {
        let mut values = self.find_all(pattern, tflags);
        if values.len() == 1 {
            values.pop()
        } else {
            None
        }
    }

    /// Pedantic lookup: ambiguous results are suppressed unless the
    /// pattern carries a wildcard.
    pub fn findp(&mut self, pattern: &str, tflags: u32) -> Vec<T> {
        let values = self.find_all(pattern, tflags);
        if values.len() <= 1 || pattern.contains('*') {
            values
        } else {
            Vec::new()
        }
    }
}
