//! Lexical search over documentation pages.
//!
//! This module provides tokenization, index construction, the frozen index
//! value type, ranking, and query resolution.

// Module declarations
pub(crate) mod builder;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use builder::IndexBuilder;
pub use index::{
    Document, DocumentId, InvertedIndex, ObjectEntry, ObjectKind, ParseObjectKindError, Posting,
    SearchIndex,
};
pub use query::{OBJECT_MATCH_SCORE, ObjectMatch, QueryOptions, SearchHit, SearchResults, Suggestion};
pub use scoring::{calculate_path_relevance, calculate_relevance, is_suffix_match};
pub use tokenize::{STOP_WORDS, Tokenizer, TokenizerSettings};
