//! Single-writer construction of a [`SearchIndex`].

use super::index::{Document, DocumentId, InvertedIndex, ObjectEntry, ObjectKind, Posting, SearchIndex};
use super::tokenize::{Tokenizer, TokenizerSettings};
use crate::error::BuildError;
use ahash::AHashMap;
use std::{collections::BTreeMap, fmt};

/// Accumulated postings: term → document → weight.
type TermTable = BTreeMap<String, BTreeMap<DocumentId, f32>>;

/// Builder for accumulating documents, objects and term frequencies.
///
/// Construction is sequential; independent builders can be combined with
/// [`IndexBuilder::merge`] before calling [`IndexBuilder::finalize`].
pub struct IndexBuilder {
    documents: Vec<Document>,
    paths: AHashMap<String, DocumentId>,
    objects: BTreeMap<String, ObjectEntry>,
    terms: TermTable,
    title_terms: TermTable,
    /// Body terms last indexed for each document, so re-indexing replaces them
    indexed: Vec<Vec<String>>,
    tokenizer: Tokenizer,
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("documents", &self.documents.len())
            .field("objects", &self.objects.len())
            .field("terms", &self.terms.len())
            .field("tokenizer", &self.tokenizer)
            .finish_non_exhaustive()
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(&TokenizerSettings::default())
    }
}

impl IndexBuilder {
    pub fn new(settings: &TokenizerSettings) -> Self {
        Self {
            documents: vec![],
            paths: AHashMap::new(),
            objects: BTreeMap::new(),
            terms: BTreeMap::new(),
            title_terms: BTreeMap::new(),
            indexed: vec![],
            tokenizer: Tokenizer::new(settings),
        }
    }

    /// Appends a document and indexes its title terms.
    pub fn add_document(
        &mut self,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<DocumentId, BuildError> {
        let path = path.into();
        if self.paths.contains_key(&path) {
            return Err(BuildError::DuplicatePath { path });
        }

        let id = DocumentId::from_index(self.documents.len());
        let title = title.into();

        for (term, count) in self.tokenizer.term_frequencies(&title) {
            self.title_terms
                .entry(term)
                .or_default()
                .insert(id, count as f32);
        }

        self.paths.insert(path.clone(), id);
        self.documents.push(Document { id, path, title });
        self.indexed.push(vec![]);

        Ok(id)
    }

    /// Inserts or overwrites an inventory entry.
    pub fn add_object(
        &mut self,
        qualified_name: impl Into<String>,
        document: DocumentId,
        kind: ObjectKind,
    ) -> Result<(), BuildError> {
        self.insert_object(qualified_name.into(), document, kind, None)
    }

    /// Like [`IndexBuilder::add_object`], with a display name override.
    pub fn add_object_with_display_name(
        &mut self,
        qualified_name: impl Into<String>,
        document: DocumentId,
        kind: ObjectKind,
        display_name: impl Into<String>,
    ) -> Result<(), BuildError> {
        self.insert_object(qualified_name.into(), document, kind, Some(display_name.into()))
    }

    fn insert_object(
        &mut self,
        qualified_name: String,
        document: DocumentId,
        kind: ObjectKind,
        display_name: Option<String>,
    ) -> Result<(), BuildError> {
        self.check_document(document)?;
        self.objects.insert(
            qualified_name,
            ObjectEntry {
                document,
                kind,
                display_name,
            },
        );
        Ok(())
    }

    /// Indexes a document's body text, replacing whatever was indexed for it before.
    ///
    /// The posting weight is the term frequency within `text`.
    pub fn index_terms(&mut self, document: DocumentId, text: &str) -> Result<(), BuildError> {
        self.check_document(document)?;

        for term in std::mem::take(&mut self.indexed[document.index()]) {
            if let Some(postings) = self.terms.get_mut(&term) {
                postings.remove(&document);
                if postings.is_empty() {
                    self.terms.remove(&term);
                }
            }
        }

        let frequencies = self.tokenizer.term_frequencies(text);
        let mut indexed = Vec::with_capacity(frequencies.len());

        for (term, count) in frequencies {
            self.terms
                .entry(term.clone())
                .or_default()
                .insert(document, count as f32);
            indexed.push(term);
        }

        self.indexed[document.index()] = indexed;
        Ok(())
    }

    /// Appends an independently built partial index, renumbering its documents.
    ///
    /// Either the whole of `other` is merged or nothing is.
    pub fn merge(&mut self, other: Self) -> Result<(), BuildError> {
        if self.tokenizer.settings() != other.tokenizer.settings() {
            return Err(BuildError::IncompatibleTokenizer);
        }

        if let Some(doc) = other
            .documents
            .iter()
            .find(|doc| self.paths.contains_key(&doc.path))
        {
            return Err(BuildError::DuplicatePath {
                path: doc.path.clone(),
            });
        }

        let offset = self.documents.len();
        let renumber = |id: DocumentId| DocumentId::from_index(id.index() + offset);

        for doc in other.documents {
            let id = renumber(doc.id);
            self.paths.insert(doc.path.clone(), id);
            self.documents.push(Document { id, ..doc });
        }
        self.indexed.extend(other.indexed);

        for (name, entry) in other.objects {
            self.objects.insert(
                name,
                ObjectEntry {
                    document: renumber(entry.document),
                    ..entry
                },
            );
        }

        for (own, theirs) in [
            (&mut self.terms, other.terms),
            (&mut self.title_terms, other.title_terms),
        ] {
            for (term, postings) in theirs {
                let merged = own.entry(term).or_default();
                merged.extend(postings.into_iter().map(|(id, weight)| (renumber(id), weight)));
            }
        }

        tracing::debug!(
            "Merged partial index: {} documents total, {} objects",
            self.documents.len(),
            self.objects.len()
        );

        Ok(())
    }

    /// Number of documents added so far.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Freezes the builder into an immutable [`SearchIndex`].
    pub fn finalize(self) -> Result<SearchIndex, BuildError> {
        if self.documents.is_empty() {
            return Err(BuildError::EmptyIndex);
        }

        let start = std::time::Instant::now();
        let index = SearchIndex {
            documents: self.documents,
            objects: self.objects,
            terms: freeze(self.terms),
            title_terms: freeze(self.title_terms),
            tokenizer: self.tokenizer.settings().clone(),
        };

        tracing::info!(
            "Built search index: {} documents, {} objects, {} unique terms, {} term-document pairs in {:?}",
            index.document_count(),
            index.objects.len(),
            index.terms.term_count(),
            index.terms.posting_count(),
            start.elapsed()
        );

        Ok(index)
    }

    fn check_document(&self, document: DocumentId) -> Result<(), BuildError> {
        if document.index() < self.documents.len() {
            Ok(())
        } else {
            Err(BuildError::UnknownDocument {
                id: document,
                count: self.documents.len(),
            })
        }
    }
}

/// Converts accumulated weights into posting lists sorted by document id.
fn freeze(table: TermTable) -> InvertedIndex {
    InvertedIndex::new(
        table
            .into_iter()
            .map(|(term, docs)| {
                let postings = docs
                    .into_iter()
                    .map(|(document, weight)| Posting { document, weight })
                    .collect();
                (term, postings)
            })
            .collect(),
    )
}
