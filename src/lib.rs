//! Abbreviation matching and unique-keyword synthesis for named entries.
//!
//! An in-memory index from short patterns (abbreviations, keywords,
//! camel-cased sigils, optionally containing a `*` wildcard) to
//! registered named entries. Matching is Unicode- and punctuation-
//! tolerant and tiered: exact forms beat dedashed forms, which beat word
//! and camel-word matches, with stop words forgiven when text is skipped.
//! The index can also synthesize the shortest keyword that uniquely
//! identifies an entry, optionally installing it for future lookups.
//!
//! Two scorers rank every query: the primary regex scorer and a legacy
//! word-order scorer kept as a cross-check. Debug builds (or the
//! `cross-check` feature) run both and log any divergence via `tracing`;
//! release builds run only the primary scorer.

pub mod text;

mod entry;
mod keyword;
mod matcher;
mod query;
mod ranking;

pub use entry::{EntryId, KW_CAMEL, KW_DASH, KW_ENSURE, KW_UNDERSCORE, TFLAG_KW};
pub use matcher::AbbreviationMatcher;
