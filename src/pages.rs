//! Page collection: turns a directory of documentation sources into index input.
//!
//! Each source file becomes one [`Page`] with a title, its full text, and the
//! Python-domain object directives it declares (`.. py:class:: Spop`,
//! `.. autofunction:: evolve_regions`, ...).

use crate::error::{BuildError, Result};
use crate::search::{IndexBuilder, ObjectKind, SearchIndex, TokenizerSettings};
use anyhow::Context;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Source file extensions collected by default.
pub const PAGE_EXTENSIONS: &[&str] = &["rst", "md", "txt"];

/// Characters that may underline a reStructuredText section title.
const RST_ADORNMENTS: &[char] = &['=', '-', '~', '^', '*', '#', '+'];

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\.\.\s+(?:py:|auto)?(module|currentmodule|class|method|attribute|function)::\s*([A-Za-z_][\w.]*)",
    )
    .expect("directive pattern is valid")
});

/// A parsed documentation source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Path relative to the source root, with `/` separators
    pub path: String,
    pub title: String,
    pub text: String,
    /// Qualified names and kinds declared on this page
    pub objects: Vec<(String, ObjectKind)>,
}

/// Parses one source file's content.
pub fn parse_page(path: &str, content: &str) -> Page {
    Page {
        path: path.to_string(),
        title: extract_title(content).unwrap_or_else(|| file_stem(path).to_string()),
        text: content.to_string(),
        objects: extract_objects(content),
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

/// Finds the page title: a Markdown `#` heading or an underlined reStructuredText title.
fn extract_title(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();

    for (i, line) in lines.iter().enumerate() {
        let text = line.trim();
        if text.is_empty() || is_adornment(text) {
            continue;
        }

        if let Some(heading) = text.strip_prefix("# ") {
            return Some(heading.trim().to_string());
        }

        if lines
            .get(i + 1)
            .is_some_and(|next| {
                let next = next.trim();
                is_adornment(next) && next.chars().count() >= text.chars().count()
            })
        {
            return Some(text.to_string());
        }
    }

    None
}

fn is_adornment(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) if RST_ADORNMENTS.contains(&first) => {
            line.len() >= 3 && chars.all(|c| c == first)
        }
        _ => false,
    }
}

/// Collects object directives, qualifying names with the current module and class.
fn extract_objects(content: &str) -> Vec<(String, ObjectKind)> {
    let mut objects = vec![];
    let mut module: Option<String> = None;
    let mut class: Option<String> = None;

    for line in content.lines() {
        let Some(captures) = DIRECTIVE.captures(line) else {
            continue;
        };
        let name = &captures[2];

        match &captures[1] {
            "module" => {
                module = Some(name.to_string());
                class = None;
                objects.push((name.to_string(), ObjectKind::Module));
            }
            "currentmodule" => {
                module = Some(name.to_string());
                class = None;
            }
            "class" => {
                let qualified = qualify(module.as_deref(), name);
                class = Some(qualified.clone());
                objects.push((qualified, ObjectKind::Class));
            }
            "function" => {
                objects.push((qualify(module.as_deref(), name), ObjectKind::Function));
            }
            member => {
                let kind = if member == "method" {
                    ObjectKind::Method
                } else {
                    ObjectKind::Attribute
                };
                let owner = class.as_deref().or(module.as_deref());
                objects.push((qualify(owner, name), kind));
            }
        }
    }

    objects
}

/// Prefixes a bare name with its owner; dotted names are taken as already qualified.
fn qualify(owner: Option<&str>, name: &str) -> String {
    match owner {
        Some(owner) if !name.contains('.') => format!("{}.{}", owner, name),
        _ => name.to_string(),
    }
}

/// Walks `root` and parses every page with a recognized extension, sorted by path.
pub fn collect_pages(root: &Path) -> Result<Vec<Page>> {
    let start = std::time::Instant::now();
    let mut entries: Vec<_> = WalkBuilder::new(root)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext))
        })
        .collect();

    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let mut pages = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match std::fs::read_to_string(path) {
            Ok(content) => pages.push(parse_page(&relative, &content)),
            Err(e) => tracing::warn!("Skipping unreadable page {}: {}", path.display(), e),
        }
    }

    anyhow::ensure!(
        !pages.is_empty(),
        "No documentation pages ({}) found under {}",
        PAGE_EXTENSIONS.join(", "),
        root.display()
    );

    tracing::info!(
        "Collected {} pages from {} in {:?}",
        pages.len(),
        root.display(),
        start.elapsed()
    );
    Ok(pages)
}

/// Builds an index from parsed pages.
pub fn build_index(
    pages: &[Page],
    settings: &TokenizerSettings,
) -> std::result::Result<SearchIndex, BuildError> {
    let mut builder = IndexBuilder::new(settings);

    for page in pages {
        let document = builder.add_document(&page.path, &page.title)?;
        builder.index_terms(document, &page.text)?;
        for (name, kind) in &page.objects {
            builder.add_object(name, document, *kind)?;
        }
    }

    builder.finalize()
}

/// Collects pages under `root` and builds an index from them.
pub fn build_from_dir(root: &Path, settings: &TokenizerSettings) -> Result<SearchIndex> {
    let pages = collect_pages(root)?;
    build_index(&pages, settings)
        .with_context(|| format!("Failed to build index from {}", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[rstest]
    #[case("Example: background selection\n==================================\n\ntext", "Example: background selection")]
    #[case("=====\nTODO\n=====\n\nitems", "TODO")]
    #[case("# Fitness models\n\nSome text", "Fitness models")]
    #[case(".. _label:\n\nModules\n-------\n", "Modules")]
    #[case("Über\n====\n\nNon-ASCII heading", "Über")]
    fn test_extract_title(#[case] content: &str, #[case] expected: &str) {
        check!(parse_page("pages/x.rst", content).title == expected);
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        check!(parse_page("pages/threads.rst", "no heading here").title == "threads");
    }

    #[test]
    fn test_extract_objects() {
        let content = "\
.. py:module:: fwdpy.fwdpy

.. py:class:: Spop

   .. py:method:: popsize

   .. py:attribute:: generation

.. py:function:: evolve_regions

.. currentmodule:: fwdpy.fitness

.. autoclass:: SpopAdditive

.. autofunction:: fwdpy.fwdpy.cite
";
        let objects = extract_objects(content);
        check!(
            objects
                == vec![
                    ("fwdpy.fwdpy".to_string(), ObjectKind::Module),
                    ("fwdpy.fwdpy.Spop".to_string(), ObjectKind::Class),
                    ("fwdpy.fwdpy.Spop.popsize".to_string(), ObjectKind::Method),
                    ("fwdpy.fwdpy.Spop.generation".to_string(), ObjectKind::Attribute),
                    ("fwdpy.fwdpy.evolve_regions".to_string(), ObjectKind::Function),
                    ("fwdpy.fitness.SpopAdditive".to_string(), ObjectKind::Class),
                    ("fwdpy.fwdpy.cite".to_string(), ObjectKind::Function),
                ]
        );
    }

    #[test]
    fn test_build_index_from_pages() {
        let pages = vec![
            parse_page("a.rst", "Intro\n=====\n\nbackground selection"),
            parse_page("b.rst", "Advanced\n========\n\n.. py:function:: fwdpy.evolve\n\nbackground selection revisited"),
        ];

        let_assert!(Ok(index) = build_index(&pages, &TokenizerSettings::default()));
        check!(index.document_count() == 2);
        check!(index.object("fwdpy.evolve").map(|e| e.document.get()) == Some(1));
        let_assert!(Ok(results) = index.search("revisited"));
        check!(results.map(|hit| hit.path()).collect::<Vec<_>>() == vec!["b.rst"]);
    }

    #[test]
    fn test_collect_pages_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pages")).unwrap();
        std::fs::write(dir.path().join("pages/regions.rst"), "Regions\n=======\n").unwrap();
        std::fs::write(dir.path().join("index.md"), "# Welcome\n").unwrap();
        std::fs::write(dir.path().join("conf.py"), "project = 'fwdpy'\n").unwrap();

        let_assert!(Ok(pages) = collect_pages(dir.path()));
        let paths: Vec<_> = pages.iter().map(|p| p.path.as_str()).collect();
        check!(paths == vec!["index.md", "pages/regions.rst"]);
        check!(pages[0].title == "Welcome");
    }

    #[test]
    fn test_collect_pages_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        check!(collect_pages(dir.path()).is_err());
    }
}
