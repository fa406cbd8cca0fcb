//! Object inventory lookup handler.

use crate::format::{render_no_results, render_object_matches};
use crate::search::{ObjectKind, SearchIndex};
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupObjectRequest {
    /// Object name, bare ('Spop') or qualified ('fwdpy.fwdpy.Spop')
    pub name: String,
    /// Only return objects of this kind
    #[serde(default)]
    pub kind: Option<ObjectKind>,
    /// Maximum number of objects to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Look up documented objects by name and render where they are defined.
pub fn handle_lookup_object(
    index: &SearchIndex,
    default_limit: usize,
    request: LookupObjectRequest,
) -> Result<String, String> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err("Object name must not be empty".to_string());
    }

    let mut matches = index.find_objects(name, request.kind);
    let mut output = String::new();

    if matches.is_empty() {
        let suggestions = index.suggest(name, 5);
        render_no_results(&mut output, name, &suggestions, index.tokenizer_settings())
            .map_err(|e| e.to_string())?;
        return Ok(output);
    }

    matches.truncate(request.limit.unwrap_or(default_limit));
    render_object_matches(&mut output, name, &matches).map_err(|e| e.to_string())?;
    Ok(output)
}
