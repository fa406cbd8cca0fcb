//! Error handling types and utilities.

use crate::search::DocumentId;
use thiserror::Error;

/// A specialized Result type for application-level docindex operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in the CLI, server and page ingestion code.
pub type Result<T> = anyhow::Result<T>;

/// Fatal errors raised while building an index.
///
/// These indicate malformed input from the page collector and abort the build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A document with the same source path was already added.
    #[error("duplicate document path '{path}'")]
    DuplicatePath { path: String },

    /// A document id does not refer to any added document.
    #[error("unknown document id {id} (index holds {count} documents)")]
    UnknownDocument { id: DocumentId, count: usize },

    /// `finalize` was called before any document was added.
    #[error("cannot finalize an index with no documents")]
    EmptyIndex,

    /// Two partial builders were configured with different tokenizers.
    #[error("cannot merge builders with different tokenizer settings")]
    IncompatibleTokenizer,
}

/// A rejected search request.
///
/// Query errors are recoverable: they are reported back to the caller, never a crash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuery {
    /// The query was empty or contained only whitespace.
    #[error("search query is empty")]
    Empty,

    /// The query exceeded the configured length cap.
    #[error("search query is {len} characters long (maximum {max})")]
    TooLong { len: usize, max: usize },
}

/// Errors raised while loading a persisted or cached index.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read index: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed index JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The file starts with `Search.setIndex(` but has no closing parenthesis.
    #[error("unterminated Search.setIndex(...) wrapper")]
    MissingWrapperEnd,

    /// An object or posting references a document that does not exist.
    #[error("{context} references document {id}, but only {count} documents exist")]
    DanglingDocument {
        context: String,
        id: u32,
        count: usize,
    },

    /// Two documents share the same source path.
    #[error("duplicate document path '{path}'")]
    DuplicatePath { path: String },

    /// A Sphinx index whose per-document tables have different lengths.
    #[error("Sphinx index has {len} {table} for {count} documents")]
    DocumentTableMismatch {
        table: &'static str,
        len: usize,
        count: usize,
    },

    /// A weighted posting map used a key that is not a document index.
    #[error("term '{term}' has posting key '{key}', expected a document index")]
    InvalidPostingKey { term: String, key: String },

    #[error("corrupt index cache: {0}")]
    Cache(#[from] postcard::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_error_display() {
        let err = BuildError::DuplicatePath {
            path: "a.rst".to_string(),
        };
        check!(err.to_string() == "duplicate document path 'a.rst'");

        let err = InvalidQuery::TooLong { len: 300, max: 256 };
        check!(err.to_string() == "search query is 300 characters long (maximum 256)");
    }

    #[test]
    fn test_dangling_document_display() {
        let err = LoadError::DanglingDocument {
            context: "term 'pop'".to_string(),
            id: 7,
            count: 2,
        };
        check!(err.to_string() == "term 'pop' references document 7, but only 2 documents exist");
    }
}
