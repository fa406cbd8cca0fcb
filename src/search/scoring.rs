//! Search relevance and ranking algorithms.
//!
//! This module provides the ordering used for free-text hits and the name
//! matching rules used for object-inventory lookups.

use super::index::DocumentId;
use std::cmp::Ordering;

/// Calculate simple text relevance score.
///
/// Returns a score based on how well the query matches the text:
/// - 100: Exact match
/// - 50: Text starts with query
/// - 10: Text contains query
/// - None: No match
pub fn calculate_relevance(text: &str, query: &str) -> Option<u32> {
    if text == query {
        Some(100)
    } else if text.starts_with(query) {
        Some(50)
    } else if text.contains(query) {
        Some(10)
    } else {
        None
    }
}

/// Calculate relevance for dotted qualified-name queries (case-insensitive).
///
/// Matches names whose trailing segments equal the query segments.
/// For example, query `fwdpy.Spop` matches `fwdpy.fwdpy.Spop`.
///
/// Returns:
/// - 100: Exact length match (name length == query length)
/// - 90: Suffix match (name is longer than query)
/// - None: No match
pub fn calculate_path_relevance(qualified_name: &str, query: &str) -> Option<u32> {
    let name: Vec<String> = qualified_name.split('.').map(str::to_lowercase).collect();
    let query: Vec<String> = query.split('.').map(str::to_lowercase).collect();

    if query.iter().any(String::is_empty) || name.len() < query.len() {
        return None;
    }

    let suffix = &name[name.len() - query.len()..];
    if suffix != query.as_slice() {
        return None;
    }

    // Prefer exact length matches over longer paths
    if name.len() == query.len() {
        Some(100)
    } else {
        Some(90)
    }
}

/// Whether `query` names `qualified_name` by its trailing dot segments (case-sensitive).
///
/// A single-segment query matches on the last segment alone, so `Spop`
/// matches `fwdpy.fwdpy.Spop`. An identical name is not a suffix match.
pub fn is_suffix_match(qualified_name: &str, query: &str) -> bool {
    if query.is_empty() || query.split('.').any(str::is_empty) {
        return false;
    }

    qualified_name.len() > query.len()
        && qualified_name.ends_with(query)
        && qualified_name[..qualified_name.len() - query.len()].ends_with('.')
}

/// Aggregate free-text score of one document for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DocumentScore {
    pub(crate) document: DocumentId,
    /// Number of distinct query terms found in the document
    pub(crate) matched_terms: usize,
    /// Sum of the per-term weights
    pub(crate) score: f32,
}

/// Ranking order for free-text hits.
///
/// Documents matching more distinct query terms come first, then higher
/// aggregate score, then lower document id.
pub(crate) fn rank_order(a: &DocumentScore, b: &DocumentScore) -> Ordering {
    b.matched_terms
        .cmp(&a.matched_terms)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.document.cmp(&b.document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("spop", "spop", Some(100))]
    #[case("spopvec", "spop", Some(50))]
    #[case("metapopvec", "pop", Some(10))]
    #[case("region", "spop", None)]
    fn test_calculate_relevance(#[case] text: &str, #[case] query: &str, #[case] expected: Option<u32>) {
        check!(calculate_relevance(text, query) == expected);
    }

    #[rstest]
    #[case("fwdpy.fwdpy.Spop", "fwdpy.fwdpy.spop", Some(100))]
    #[case("fwdpy.fwdpy.Spop", "fwdpy.Spop", Some(90))]
    #[case("fwdpy.fwdpy.Spop", "Spop", Some(90))]
    #[case("fwdpy.fwdpy.Spop", "fitness.Spop", None)]
    #[case("fwdpy.fwdpy.Spop", "fwdpy..Spop", None)]
    #[case("Spop", "fwdpy.Spop", None)]
    fn test_calculate_path_relevance(
        #[case] name: &str,
        #[case] query: &str,
        #[case] expected: Option<u32>,
    ) {
        check!(calculate_path_relevance(name, query) == expected);
    }

    #[rstest]
    #[case("fwdpy.fwdpy.Spop", "Spop", true)]
    #[case("fwdpy.fwdpy.Spop", "fwdpy.Spop", true)]
    #[case("fwdpy.fwdpy.Spop", "fwdpy.fwdpy.Spop", false)] // exact, not suffix
    #[case("fwdpy.fwdpy.Spop", "pop", false)] // partial segment
    #[case("fwdpy.fwdpy.Spop", "spop", false)] // case-sensitive
    #[case("fwdpy.fwdpy.Spop", ".Spop", false)]
    #[case("fwdpy.fwdpy.Spop", "", false)]
    fn test_is_suffix_match(#[case] name: &str, #[case] query: &str, #[case] expected: bool) {
        check!(is_suffix_match(name, query) == expected);
    }

    #[test]
    fn test_rank_order() {
        let score = |id: u32, matched_terms: usize, score: f32| DocumentScore {
            document: DocumentId::new(id),
            matched_terms,
            score,
        };

        let mut hits = vec![
            score(0, 1, 9.0),
            score(3, 2, 1.0),
            score(2, 2, 4.0),
            score(1, 2, 4.0),
        ];
        hits.sort_by(rank_order);

        let order: Vec<_> = hits.iter().map(|h| h.document.get()).collect();
        check!(order == vec![1, 2, 3, 0]);
    }
}
