//! Fingerprinted binary cache of built indexes.
//!
//! Each source tree owns one cache entry, named after a digest of its canonical
//! root path. The entry holds an xxh3 fingerprint of every page (path and
//! content) plus the tokenizer settings, followed by the postcard encoded
//! index. When the fingerprint still matches, the index is loaded instead of
//! re-tokenizing every page; otherwise the rebuilt index replaces the entry.

use crate::config::CacheConfig;
use crate::error::{LoadError, Result};
use crate::pages::{Page, build_index};
use crate::search::{SearchIndex, TokenizerSettings};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Bumped whenever the cached encoding of [`SearchIndex`] changes.
const CACHE_FORMAT_VERSION: u32 = 2;

/// Digest identifying a set of page sources and tokenizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Computes the fingerprint of pages in their collected order.
    pub fn compute(pages: &[Page], settings: &TokenizerSettings) -> Result<Self> {
        let mut hasher = Xxh3::new();
        hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());

        let settings =
            postcard::to_allocvec(settings).context("Failed to encode tokenizer settings")?;
        hasher.update(&settings);

        for page in pages {
            // Length prefixes keep ("ab", "c") and ("a", "bc") distinct
            for part in [&page.path, &page.text] {
                hasher.update(&(part.len() as u64).to_le_bytes());
                hasher.update(part.as_bytes());
            }
        }

        Ok(Self(hasher.digest()))
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Directory of cached indexes, one file per source root.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache described by configuration, or `None` when disabled or no directory is available.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        config.directory().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry file for a source root. Roots that cannot be canonicalized are keyed as given.
    pub fn entry_path(&self, root: &Path) -> PathBuf {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let key = xxh3_64(root.as_os_str().as_encoded_bytes());
        self.dir.join(format!("{key:016x}.index"))
    }

    /// Loads the cached index of `root` if it was built from sources matching `fingerprint`.
    ///
    /// Entries that fail to decode or validate are deleted. Stale entries are left
    /// for [`IndexCache::store`] to overwrite.
    pub fn load(&self, root: &Path, fingerprint: Fingerprint) -> Option<SearchIndex> {
        let path = self.entry_path(root);
        let bytes = std::fs::read(&path).ok()?;

        match decode(&bytes) {
            Ok((stored, index)) if stored == fingerprint.as_u64() => {
                tracing::debug!("Using cached index {}", path.display());
                Some(index)
            }
            Ok((stored, _)) => {
                tracing::debug!(
                    "Cached index {} is stale ({:016x}, expected {})",
                    path.display(),
                    stored,
                    fingerprint
                );
                None
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable cached index at {}: {}", path.display(), e);
                let _ = std::fs::remove_file(&path);
                None
            }
        }
    }

    /// Stores the index of `root`, replacing any previous entry for that root.
    pub fn store(
        &self,
        root: &Path,
        fingerprint: Fingerprint,
        index: &SearchIndex,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory {}", self.dir.display()))?;

        let path = self.entry_path(root);
        let bytes = postcard::to_allocvec(&(fingerprint.as_u64(), index))
            .context("Failed to encode index")?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write cached index to {}", path.display()))?;

        tracing::debug!("Cached search index to {}", path.display());
        Ok(path)
    }
}

/// Builds an index from the pages of `root`, reusing a cached build of identical sources.
pub fn build_cached(
    root: &Path,
    pages: &[Page],
    settings: &TokenizerSettings,
    cache: Option<&IndexCache>,
) -> Result<SearchIndex> {
    let Some(cache) = cache else {
        return Ok(build_index(pages, settings)?);
    };

    let fingerprint = Fingerprint::compute(pages, settings)?;
    if let Some(index) = cache.load(root, fingerprint) {
        tracing::info!("Cache hit for {} pages ({})", pages.len(), fingerprint);
        return Ok(index);
    }

    tracing::debug!("Cache miss for fingerprint {}", fingerprint);
    let index = build_index(pages, settings)?;
    if let Err(e) = cache.store(root, fingerprint, &index) {
        tracing::warn!("Failed to cache index: {:#}", e);
    }
    Ok(index)
}

// Deserializing a `SearchIndex` validates it
fn decode(bytes: &[u8]) -> std::result::Result<(u64, SearchIndex), LoadError> {
    Ok(postcard::from_bytes(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::parse_page;
    use assert2::{check, let_assert};

    fn pages() -> Vec<Page> {
        vec![
            parse_page("a.rst", "Intro\n=====\n\nbackground selection"),
            parse_page("b.rst", "Advanced\n========\n\nbackground selection revisited"),
        ]
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let settings = TokenizerSettings::default();
        let first = Fingerprint::compute(&pages(), &settings).unwrap();
        let second = Fingerprint::compute(&pages(), &settings).unwrap();
        check!(first == second);
        check!(first.to_string().len() == 16);
    }

    #[test]
    fn test_fingerprint_tracks_content_and_settings() {
        let settings = TokenizerSettings::default();
        let base = Fingerprint::compute(&pages(), &settings).unwrap();

        let mut edited = pages();
        edited[1].text.push_str(" again");
        check!(Fingerprint::compute(&edited, &settings).unwrap() != base);

        let unstemmed = TokenizerSettings {
            stem: false,
            ..TokenizerSettings::default()
        };
        check!(Fingerprint::compute(&pages(), &unstemmed).unwrap() != base);
    }

    #[test]
    fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let settings = TokenizerSettings::default();
        let index = build_index(&pages(), &settings).unwrap();
        let fingerprint = Fingerprint::compute(&pages(), &settings).unwrap();

        check!(cache.load(dir.path(), fingerprint).is_none());
        let_assert!(Ok(path) = cache.store(dir.path(), fingerprint, &index));
        check!(path.exists());
        let_assert!(Some(cached) = cache.load(dir.path(), fingerprint));
        check!(cached == index);
    }

    #[test]
    fn test_stale_entry_is_not_used() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let settings = TokenizerSettings::default();
        let index = build_index(&pages(), &settings).unwrap();
        let fingerprint = Fingerprint::compute(&pages(), &settings).unwrap();
        cache.store(dir.path(), fingerprint, &index).unwrap();

        let mut edited = pages();
        edited[0].text.push_str(" drift");
        let changed = Fingerprint::compute(&edited, &settings).unwrap();

        check!(cache.load(dir.path(), changed).is_none());
        check!(cache.entry_path(dir.path()).exists());
    }

    #[test]
    fn test_corrupt_entry_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let fingerprint = Fingerprint::compute(&pages(), &TokenizerSettings::default()).unwrap();

        let path = cache.entry_path(dir.path());
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();

        check!(cache.load(dir.path(), fingerprint).is_none());
        check!(!path.exists());
    }

    #[test]
    fn test_build_cached_reuses_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let settings = TokenizerSettings::default();

        let_assert!(Ok(first) = build_cached(dir.path(), &pages(), &settings, Some(&cache)));
        check!(entries(cache.dir()) == 1);

        let_assert!(Ok(second) = build_cached(dir.path(), &pages(), &settings, Some(&cache)));
        check!(first == second);
        check!(entries(cache.dir()) == 1);
    }

    #[test]
    fn test_edited_sources_replace_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let settings = TokenizerSettings::default();

        let_assert!(Ok(first) = build_cached(dir.path(), &pages(), &settings, Some(&cache)));

        let mut edited = pages();
        edited[1].text.push_str(" drift");
        let_assert!(Ok(second) = build_cached(dir.path(), &edited, &settings, Some(&cache)));

        check!(first != second);
        check!(entries(cache.dir()) == 1);
        let fingerprint = Fingerprint::compute(&edited, &settings).unwrap();
        let_assert!(Some(cached) = cache.load(dir.path(), fingerprint));
        check!(cached == second);
    }

    #[test]
    fn test_roots_have_separate_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("cache"));
        let settings = TokenizerSettings::default();

        build_cached(&dir.path().join("one"), &pages(), &settings, Some(&cache)).unwrap();
        build_cached(&dir.path().join("two"), &pages(), &settings, Some(&cache)).unwrap();
        check!(entries(cache.dir()) == 2);
    }

    #[test]
    fn test_disabled_cache() {
        let config = CacheConfig {
            enabled: false,
            dir: Some(PathBuf::from("/tmp/unused")),
        };
        check!(IndexCache::from_config(&config).is_none());
    }
}
