//! The frozen search index: documents, object inventory and term postings.

use super::tokenize::TokenizerSettings;
use crate::error::LoadError;
use ahash::AHashSet;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Dense 0-based index of a document within its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u32);

impl DocumentId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Builds the id for the document stored at `index` in the document arena.
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("document count exceeds u32::MAX"))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Source file identifier, unique within the index (e.g. `pages/regions.rst`)
    pub path: String,
    pub title: String,
}

/// Kind of a documented symbol.
///
/// Variants carry no doc comments so the MCP tool schema stays a plain string enum.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Module,
    Class,
    Method,
    Attribute,
    Function,
}

impl ObjectKind {
    pub const ALL: [Self; 5] = [
        Self::Module,
        Self::Class,
        Self::Method,
        Self::Attribute,
        Self::Function,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Method => "method",
            Self::Attribute => "attribute",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown object kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseObjectKindError(pub String);

impl fmt::Display for ParseObjectKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown object kind '{}' (expected one of: module, class, method, attribute, function)",
            self.0
        )
    }
}

impl std::error::Error for ParseObjectKindError {}

impl FromStr for ObjectKind {
    type Err = ParseObjectKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ParseObjectKindError(s.to_string()))
    }
}

/// Inventory entry for a documented symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Page that defines the symbol
    pub document: DocumentId,
    pub kind: ObjectKind,
    /// Optional override for how the symbol is displayed
    pub display_name: Option<String>,
}

/// A (document, weight) pair recorded under a term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub document: DocumentId,
    pub weight: f32,
}

/// Map from term to postings, each posting list sorted by document id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    terms: BTreeMap<String, Vec<Posting>>,
}

impl InvertedIndex {
    pub(crate) const fn new(terms: BTreeMap<String, Vec<Posting>>) -> Self {
        Self { terms }
    }

    /// Postings for a term, or an empty slice if the term is not indexed.
    pub fn get(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map_or(&[], Vec::as_slice)
    }

    /// Iterate terms and their postings in term order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        self.terms
            .iter()
            .map(|(term, postings)| (term.as_str(), postings.as_slice()))
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Total number of term-document pairs
    pub fn posting_count(&self) -> usize {
        self.terms.values().map(Vec::len).sum()
    }
}

/// An immutable, fully built search index.
///
/// Obtained from [`IndexBuilder::finalize`](super::IndexBuilder::finalize) or by
/// loading a persisted form, both of which guarantee that every object and
/// posting references an existing document. It holds no interior mutability
/// and can be shared across threads for concurrent queries. Deserializing
/// runs the same validation as loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchIndex")]
pub struct SearchIndex {
    pub(super) documents: Vec<Document>,
    pub(super) objects: BTreeMap<String, ObjectEntry>,
    pub(super) terms: InvertedIndex,
    pub(super) title_terms: InvertedIndex,
    pub(super) tokenizer: TokenizerSettings,
}

/// Unvalidated field-for-field mirror of [`SearchIndex`] used while deserializing.
#[derive(Deserialize)]
struct RawSearchIndex {
    documents: Vec<Document>,
    objects: BTreeMap<String, ObjectEntry>,
    terms: InvertedIndex,
    title_terms: InvertedIndex,
    tokenizer: TokenizerSettings,
}

impl TryFrom<RawSearchIndex> for SearchIndex {
    type Error = LoadError;

    fn try_from(raw: RawSearchIndex) -> Result<Self, Self::Error> {
        Self::from_parts(
            raw.documents,
            raw.objects,
            raw.terms,
            raw.title_terms,
            raw.tokenizer,
        )
    }
}

impl SearchIndex {
    /// Assembles an index from loaded parts, checking referential integrity.
    pub(crate) fn from_parts(
        documents: Vec<Document>,
        objects: BTreeMap<String, ObjectEntry>,
        terms: InvertedIndex,
        title_terms: InvertedIndex,
        tokenizer: TokenizerSettings,
    ) -> Result<Self, LoadError> {
        let index = Self {
            documents,
            objects,
            terms,
            title_terms,
            tokenizer,
        };
        index.validate()?;
        Ok(index)
    }

    /// Checks that document ids are dense, paths are unique, and every reference resolves.
    pub fn validate(&self) -> Result<(), LoadError> {
        let count = self.documents.len();
        let dangling = |context: String, id: DocumentId| LoadError::DanglingDocument {
            context,
            id: id.get(),
            count,
        };

        let mut paths = AHashSet::with_capacity(count);
        for (position, document) in self.documents.iter().enumerate() {
            if document.id.index() != position {
                return Err(dangling(
                    format!("document at position {}", position),
                    document.id,
                ));
            }
            if !paths.insert(document.path.as_str()) {
                return Err(LoadError::DuplicatePath {
                    path: document.path.clone(),
                });
            }
        }

        for (name, entry) in &self.objects {
            if entry.document.index() >= count {
                return Err(dangling(format!("object '{}'", name), entry.document));
            }
        }

        for (table, index) in [("term", &self.terms), ("title term", &self.title_terms)] {
            for (term, postings) in index.iter() {
                if let Some(posting) = postings.iter().find(|p| p.document.index() >= count) {
                    return Err(dangling(format!("{} '{}'", table, term), posting.document));
                }
            }
        }

        Ok(())
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.index())
    }

    pub fn objects(&self) -> &BTreeMap<String, ObjectEntry> {
        &self.objects
    }

    pub fn object(&self, qualified_name: &str) -> Option<&ObjectEntry> {
        self.objects.get(qualified_name)
    }

    /// Body-text term postings
    pub fn terms(&self) -> &InvertedIndex {
        &self.terms
    }

    /// Page-title term postings
    pub fn title_terms(&self) -> &InvertedIndex {
        &self.title_terms
    }

    pub fn tokenizer_settings(&self) -> &TokenizerSettings {
        &self.tokenizer
    }

    /// Get the number of documents in the index
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}
