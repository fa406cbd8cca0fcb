//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `docs_site`: a small Sphinx-style documentation tree on disk
//! - `two_page_index`: the two-page "background selection" index built in memory
//!
//! [`TempWorkspace`] provides the temp directory abstraction behind `docs_site`
//! and any test that needs filesystem isolation.

use docindex::{IndexBuilder, SearchIndex};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content, creating parent directories as needed.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

const INDEX_PAGE: &str = "\
fwdpy documentation
===================

fwdpy is a Python package for forward-time population genetic simulation.

.. toctree::

   pages/regions
   pages/fitness
";

const REGIONS_PAGE: &str = "\
Mutation and recombination regions
==================================

.. py:module:: fwdpy.fwdpy

.. py:class:: Region

   A genomic region with a beginning, an end and a weight.

   .. py:attribute:: weight

.. py:class:: Sregion

   A region where selected mutations arise.

.. py:function:: evolve_regions

   Evolve populations of diploids under mutation, recombination and selection.
";

const FITNESS_PAGE: &str = "\
# Fitness models

Background selection reduces diversity near selected sites. Each model maps
genotypes to fitness.

.. currentmodule:: fwdpy.fitness

.. autoclass:: SpopAdditive

.. autoclass:: SpopMult
";

/// A documentation tree with three pages and Python-domain directives.
#[allow(dead_code)] // Used by build tests only
#[fixture]
pub fn docs_site() -> TempWorkspace {
    let workspace = TempWorkspace::new();
    workspace.create_file("index.rst", INDEX_PAGE);
    workspace.create_file("pages/regions.rst", REGIONS_PAGE);
    workspace.create_file("pages/fitness.md", FITNESS_PAGE);
    workspace.create_file("conf.py", "project = 'fwdpy'\n");
    workspace
}

/// Two pages sharing "background selection"; only `b.rst` says "revisited".
#[allow(dead_code)] // Used by search tests only
#[fixture]
pub fn two_page_index() -> SearchIndex {
    let mut builder = IndexBuilder::default();
    let a = builder.add_document("a.rst", "Intro").unwrap();
    let b = builder.add_document("b.rst", "Advanced").unwrap();
    builder.index_terms(a, "background selection").unwrap();
    builder
        .index_terms(b, "background selection revisited")
        .unwrap();
    builder.finalize().unwrap()
}
