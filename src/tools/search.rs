//! Full-text search handler over a loaded documentation index.

use crate::format::{render_no_results, render_search_results};
use crate::search::{QueryOptions, SearchIndex};
use rmcp::schemars;
use serde::Deserialize;

/// Number of "did you mean" suggestions shown when nothing matched.
const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free-text query; a qualified object name such as 'fwdpy.fwdpy.Spop' ranks its page first
    pub query: String,
    /// Maximum number of results to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Execute a search and render the ranked pages.
pub fn handle_search(
    index: &SearchIndex,
    options: &QueryOptions,
    request: SearchRequest,
) -> Result<String, String> {
    let limit = request.limit.unwrap_or(options.default_limit);
    let results = index
        .search_with(&request.query, options)
        .map_err(|e| format!("Invalid query: {}", e))?;

    let mut output = String::new();
    if results.len() == 0 {
        let suggestions = index.suggest(&request.query, SUGGESTION_LIMIT);
        render_no_results(
            &mut output,
            request.query.trim(),
            &suggestions,
            index.tokenizer_settings(),
        )
        .map_err(|e| e.to_string())?;
        return Ok(output);
    }

    render_search_results(&mut output, request.query.trim(), results.take(limit))
        .map_err(|e| e.to_string())?;
    Ok(output)
}
