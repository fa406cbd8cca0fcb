//! Index summary handler.

use crate::format::render_index_info;
use crate::search::SearchIndex;
use std::path::Path;

/// Render document, object, and term counts for the served index.
pub fn handle_index_info(index: &SearchIndex, source: Option<&Path>) -> Result<String, String> {
    let mut output = String::new();
    if let Some(source) = source {
        output.push_str(&format!("Index: {}\n", source.display()));
    }
    render_index_info(&mut output, index).map_err(|e| e.to_string())?;
    Ok(output)
}
