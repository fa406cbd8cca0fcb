//! Persisted index formats and text rendering.

pub mod persisted;
pub(crate) mod renderers;
mod sphinx;

// Re-exports
pub use persisted::{load_file, parse, to_js, to_json};
pub use renderers::{
    render_index_info, render_no_results, render_object_matches, render_search_results,
};

/// On-disk form written by `docindex build`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain JSON object
    #[default]
    Json,
    /// JSON wrapped in `Search.setIndex(...)`, loadable as a script
    Js,
}

impl OutputFormat {
    /// Serializes an index in this format.
    pub fn render(self, index: &crate::search::SearchIndex) -> Result<String, serde_json::Error> {
        match self {
            Self::Json => to_json(index),
            Self::Js => to_js(index),
        }
    }
}
