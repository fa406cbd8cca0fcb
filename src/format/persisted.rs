//! JSON and `Search.setIndex(...)` persisted forms of a [`SearchIndex`].
//!
//! The writer always emits weighted posting maps with every map ordered, so
//! identical input produces byte-identical output. The reader also accepts
//! the bare document-list and single-document posting forms, and imports the
//! `searchindex.js` scripts generated by Sphinx.

use super::sphinx;
use crate::error::LoadError;
use crate::search::{
    Document, DocumentId, InvertedIndex, ObjectEntry, ObjectKind, Posting, SearchIndex,
    TokenizerSettings,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

const JS_PREFIX: &str = "Search.setIndex(";

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile<P> {
    documents: Vec<DocumentRecord>,
    #[serde(default)]
    objects: BTreeMap<String, ObjectRecord>,
    terms: BTreeMap<String, P>,
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    titleterms: BTreeMap<String, P>,
    #[serde(default)]
    tokenizer: TokenizerSettings,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    path: String,
    title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectRecord {
    document_index: u32,
    kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

/// Postings as written: document index → weight.
type WeightedPostings = BTreeMap<u32, f32>;

/// Postings as read, in any of the accepted shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RawPostings {
    Single(u32),
    List(Vec<u32>),
    Weighted(BTreeMap<String, f32>),
}

/// Serializes an index to compact JSON.
pub fn to_json(index: &SearchIndex) -> Result<String, serde_json::Error> {
    let file = IndexFile {
        documents: index
            .documents()
            .iter()
            .map(|doc| DocumentRecord {
                path: doc.path.clone(),
                title: doc.title.clone(),
            })
            .collect(),
        objects: index
            .objects()
            .iter()
            .map(|(name, entry)| {
                let record = ObjectRecord {
                    document_index: entry.document.get(),
                    kind: entry.kind,
                    display_name: entry.display_name.clone(),
                };
                (name.clone(), record)
            })
            .collect(),
        terms: weighted(index.terms()),
        titleterms: weighted(index.title_terms()),
        tokenizer: index.tokenizer_settings().clone(),
    };

    serde_json::to_string(&file)
}

/// Serializes an index as a `Search.setIndex(...)` script.
pub fn to_js(index: &SearchIndex) -> Result<String, serde_json::Error> {
    Ok(format!("{}{})", JS_PREFIX, to_json(index)?))
}

fn weighted(index: &InvertedIndex) -> BTreeMap<String, WeightedPostings> {
    index
        .iter()
        .map(|(term, postings)| {
            let postings = postings
                .iter()
                .map(|posting| (posting.document.get(), posting.weight))
                .collect();
            (term.to_string(), postings)
        })
        .collect()
}

/// Parses either persisted form, or a Sphinx `searchindex.js`, and validates
/// referential integrity.
pub fn parse(input: &str) -> Result<SearchIndex, LoadError> {
    let trimmed = input.trim();
    let json = if trimmed.starts_with(JS_PREFIX) {
        // Scripts may use bare JavaScript object keys
        Cow::Owned(sphinx::quote_object_keys(strip_js_wrapper(trimmed)?))
    } else {
        Cow::Borrowed(trimmed)
    };

    let value: serde_json::Value = serde_json::from_str(&json)?;
    if sphinx::is_sphinx_index(&value) {
        return sphinx::import(value);
    }
    from_file(serde_json::from_value(value)?)
}

fn from_file(file: IndexFile<RawPostings>) -> Result<SearchIndex, LoadError> {

    let documents = file
        .documents
        .into_iter()
        .enumerate()
        .map(|(position, record)| Document {
            id: DocumentId::from_index(position),
            path: record.path,
            title: record.title,
        })
        .collect();

    let objects = file
        .objects
        .into_iter()
        .map(|(name, record)| {
            let entry = ObjectEntry {
                document: DocumentId::new(record.document_index),
                kind: record.kind,
                display_name: record.display_name,
            };
            (name, entry)
        })
        .collect();

    SearchIndex::from_parts(
        documents,
        objects,
        postings(file.terms)?,
        postings(file.titleterms)?,
        file.tokenizer,
    )
}

/// Reads and parses a persisted index from disk.
pub fn load_file(path: &Path) -> Result<SearchIndex, LoadError> {
    let content = std::fs::read_to_string(path)?;
    let index = parse(&content)?;
    tracing::info!(
        "Loaded search index from {} ({} documents, {} terms)",
        path.display(),
        index.document_count(),
        index.terms().term_count()
    );
    Ok(index)
}

fn strip_js_wrapper(input: &str) -> Result<&str, LoadError> {
    let trimmed = input.trim();
    let Some(body) = trimmed.strip_prefix(JS_PREFIX) else {
        return Ok(trimmed);
    };

    body.trim_end()
        .trim_end_matches(';')
        .trim_end()
        .strip_suffix(')')
        .ok_or(LoadError::MissingWrapperEnd)
}

pub(super) fn postings(raw: BTreeMap<String, RawPostings>) -> Result<InvertedIndex, LoadError> {
    let mut terms = BTreeMap::new();

    for (term, raw) in raw {
        let mut weights: BTreeMap<u32, f32> = BTreeMap::new();
        match raw {
            RawPostings::Single(document) => {
                weights.insert(document, 1.0);
            }
            RawPostings::List(documents) => {
                weights.extend(documents.into_iter().map(|document| (document, 1.0)));
            }
            RawPostings::Weighted(map) => {
                for (key, weight) in map {
                    let document = key.parse().map_err(|_| LoadError::InvalidPostingKey {
                        term: term.clone(),
                        key: key.clone(),
                    })?;
                    weights.insert(document, weight);
                }
            }
        }

        let postings = weights
            .into_iter()
            .map(|(document, weight)| Posting {
                document: DocumentId::new(document),
                weight,
            })
            .collect();
        terms.insert(term, postings);
    }

    Ok(InvertedIndex::new(terms))
}
