//! Query resolution against a frozen [`SearchIndex`].
//!
//! Queries are tokenized with the index's own tokenizer settings, postings are
//! combined by weighted union, and object-inventory hits are ranked first.

use super::index::{Document, DocumentId, ObjectEntry, ObjectKind, SearchIndex};
use super::scoring::{
    DocumentScore, calculate_path_relevance, calculate_relevance, is_suffix_match, rank_order,
};
use super::tokenize::Tokenizer;
use crate::error::InvalidQuery;
use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score assigned to documents reached through an object-inventory match.
pub const OBJECT_MATCH_SCORE: f32 = f32::MAX;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Query-time ranking and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Multiplier applied to title-term weights before summing with body weights
    pub title_weight: f32,
    /// Queries longer than this many characters are rejected
    pub max_query_length: usize,
    /// Number of results shown when the caller does not pass a limit
    pub default_limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            title_weight: 2.0,
            max_query_length: 256,
            default_limit: 10,
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub document: &'a Document,
    pub score: f32,
    /// Distinct query terms found in the document
    pub matched_terms: usize,
    /// Qualified name of the object that placed this document, if any
    pub object: Option<&'a str>,
}

impl<'a> SearchHit<'a> {
    pub fn title(&self) -> &'a str {
        &self.document.title
    }

    pub fn path(&self) -> &'a str {
        &self.document.path
    }

    pub fn is_object_match(&self) -> bool {
        self.object.is_some()
    }
}

#[derive(Debug, Clone)]
struct RankedDocument<'a> {
    score: DocumentScore,
    object: Option<&'a str>,
}

/// Ordered search results, resolved to documents as they are consumed.
///
/// Cloning the iterator restarts consumption from the same position; the
/// index itself keeps no state between queries.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    index: &'a SearchIndex,
    ranked: std::vec::IntoIter<RankedDocument<'a>>,
}

impl<'a> Iterator for SearchResults<'a> {
    type Item = SearchHit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let ranked = self.ranked.next()?;
        // Ranked ids come from a validated index and always resolve
        let document = self.index.document(ranked.score.document)?;
        Some(SearchHit {
            document,
            score: ranked.score.score,
            matched_terms: ranked.score.matched_terms,
            object: ranked.object,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranked.size_hint()
    }
}

impl ExactSizeIterator for SearchResults<'_> {}

/// An object-inventory entry matched by name.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMatch<'a> {
    pub name: &'a str,
    pub entry: &'a ObjectEntry,
    pub document: &'a Document,
    /// 100 exact, 90 qualified suffix, 50 prefix, 10 substring
    pub relevance: u32,
}

/// A fuzzy "did you mean" suggestion for an object name.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion<'a> {
    pub name: &'a str,
    /// Similarity from 0.0 to 1.0, higher is better
    pub score: f64,
}

impl SearchIndex {
    /// Searches with default [`QueryOptions`].
    pub fn search(&self, query: &str) -> Result<SearchResults<'_>, InvalidQuery> {
        self.search_with(query, &QueryOptions::default())
    }

    /// Searches the index and returns documents ordered by relevance.
    ///
    /// Documents owning an object whose qualified name equals the query, or
    /// ends with it on a dot boundary, come first with [`OBJECT_MATCH_SCORE`].
    /// The remaining documents are ranked by the number of distinct query terms
    /// they contain, then by summed term weight, then by document id.
    pub fn search_with(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<SearchResults<'_>, InvalidQuery> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InvalidQuery::Empty);
        }

        let len = query.chars().count();
        if len > options.max_query_length {
            return Err(InvalidQuery::TooLong {
                len,
                max: options.max_query_length,
            });
        }

        let tokenizer = Tokenizer::new(&self.tokenizer);
        let mut tokens = tokenizer.tokenize(query);
        tokens.sort_unstable();
        tokens.dedup();

        let mut seen = vec![false; self.documents.len()];
        let mut ranked = vec![];

        for (name, entry) in self.object_hits(query) {
            if !std::mem::replace(&mut seen[entry.document.index()], true) {
                ranked.push(RankedDocument {
                    score: DocumentScore {
                        document: entry.document,
                        matched_terms: tokens.len(),
                        score: OBJECT_MATCH_SCORE,
                    },
                    object: Some(name),
                });
            }
        }
        let object_count = ranked.len();

        let mut scores: BTreeMap<DocumentId, DocumentScore> = BTreeMap::new();
        for token in &tokens {
            let mut token_weights: BTreeMap<DocumentId, f32> = BTreeMap::new();
            for posting in self.terms.get(token) {
                *token_weights.entry(posting.document).or_insert(0.0) += posting.weight;
            }
            for posting in self.title_terms.get(token) {
                *token_weights.entry(posting.document).or_insert(0.0) +=
                    posting.weight * options.title_weight;
            }

            for (document, weight) in token_weights {
                let score = scores.entry(document).or_insert(DocumentScore {
                    document,
                    matched_terms: 0,
                    score: 0.0,
                });
                score.matched_terms += 1;
                score.score += weight;
            }
        }

        let mut text_hits: Vec<_> = scores
            .into_values()
            .filter(|score| !seen[score.document.index()])
            .collect();
        text_hits.sort_by(rank_order);
        ranked.extend(
            text_hits
                .into_iter()
                .map(|score| RankedDocument { score, object: None }),
        );

        tracing::debug!(
            "Query '{}': {} terms, {} object hits, {} results",
            query,
            tokens.len(),
            object_count,
            ranked.len()
        );

        Ok(SearchResults {
            index: self,
            ranked: ranked.into_iter(),
        })
    }

    /// Objects named by the raw query: the exact key first, then suffix matches by name.
    fn object_hits<'a, 'q>(
        &'a self,
        query: &'q str,
    ) -> impl Iterator<Item = (&'a str, &'a ObjectEntry)> + use<'a, 'q> {
        let exact = self
            .objects
            .get_key_value(query)
            .map(|(name, entry)| (name.as_str(), entry));

        let suffix = self
            .objects
            .iter()
            .filter(move |(name, _)| is_suffix_match(name, query))
            .map(|(name, entry)| (name.as_str(), entry));

        exact.into_iter().chain(suffix)
    }

    /// Looks up objects by name, ordered by relevance then qualified name.
    ///
    /// Dotted queries match trailing segments of qualified names; plain queries
    /// are compared against the last segment. Matching is case-insensitive.
    pub fn find_objects(&self, name: &str, kind: Option<ObjectKind>) -> Vec<ObjectMatch<'_>> {
        let name = name.trim();
        if name.is_empty() {
            return vec![];
        }
        let lowercase = name.to_lowercase();
        let dotted = name.contains('.');

        let mut matches: Vec<_> = self
            .objects
            .iter()
            .filter(|(_, entry)| kind.is_none_or(|kind| entry.kind == kind))
            .filter_map(|(qualified, entry)| {
                let relevance = if dotted {
                    calculate_path_relevance(qualified, name)?
                } else {
                    let last = qualified.rsplit('.').next().unwrap_or(qualified);
                    calculate_relevance(&last.to_lowercase(), &lowercase)?
                };
                Some(ObjectMatch {
                    name: qualified,
                    entry,
                    document: self.document(entry.document)?,
                    relevance,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.relevance.cmp(&a.relevance).then_with(|| a.name.cmp(b.name)));
        matches
    }

    /// Suggests object names similar to `name`, best first.
    pub fn suggest(&self, name: &str, limit: usize) -> Vec<Suggestion<'_>> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return vec![];
        }

        let mut suggestions: Vec<_> = self
            .objects
            .keys()
            .filter_map(|qualified| {
                let lowercase = qualified.to_lowercase();
                let last = lowercase.rsplit('.').next().unwrap_or(&lowercase);
                let score = jaro_winkler::similarity(query.chars(), last.chars())
                    .max(jaro_winkler::similarity(query.chars(), lowercase.chars()));
                (score > SUGGESTION_THRESHOLD).then_some(Suggestion {
                    name: qualified,
                    score,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(b.name)));
        suggestions.truncate(limit);
        suggestions
    }
}
