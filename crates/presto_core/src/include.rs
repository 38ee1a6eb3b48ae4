//! Include resolution for `include("…")` calls.
//!
//! A [`SourceProvider`] maps the quoted include argument to source text plus a
//! canonical reference name.  Two backends are provided: a project-folder
//! resolver for on-disk scripts and an in-memory collection for embedded
//! scripts.  Duplicate-include detection is not the provider's job; the
//! engine tracks loaded canonical names in its included-file set.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// The result of resolving an include argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// The loaded source text.  Empty text turns the include into a no-op.
    pub text: String,
    /// Canonical name used for duplicate detection and error reporting.
    pub canonical_name: String,
}

/// Maps an include argument to source text and a canonical name.
///
/// Implementations return `Err` with a bare message (no position); the parser
/// attaches the location of the offending `include(…)` call.
pub trait SourceProvider {
    /// Resolves `include_argument` (the string literal, quotes already
    /// removed by the lexer).
    fn resolve(&self, include_argument: &str) -> Result<ResolvedSource, String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Project-folder backend
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves include arguments as paths under a project folder.
///
/// The file must exist; a missing file is an error.
#[derive(Debug, Clone)]
pub struct ProjectFolderProvider {
    root: PathBuf,
}

impl ProjectFolderProvider {
    /// Creates a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceProvider for ProjectFolderProvider {
    fn resolve(&self, include_argument: &str) -> Result<ResolvedSource, String> {
        let trimmed = include_argument.trim_matches(|c| c == '"' || c == '\'');
        let path = self.root.join(trimmed);
        let canonical_name = path.to_string_lossy().into_owned();
        let text =
            fs::read_to_string(&path).map_err(|_| format!("File {canonical_name} not found"))?;
        Ok(ResolvedSource {
            text,
            canonical_name,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedded-collection backend
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves include arguments against an in-memory script collection.
///
/// A name missing from the collection resolves to empty text, which the
/// parser treats as a no-op include.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCollectionProvider {
    scripts: HashMap<String, String>,
}

impl EmbeddedCollectionProvider {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a script under `name`.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.scripts.insert(name.into(), text.into());
    }
}

impl SourceProvider for EmbeddedCollectionProvider {
    fn resolve(&self, include_argument: &str) -> Result<ResolvedSource, String> {
        let trimmed = include_argument.trim_matches(|c| c == '"' || c == '\'');
        let text = self.scripts.get(trimmed).cloned().unwrap_or_default();
        Ok(ResolvedSource {
            text,
            canonical_name: trimmed.to_owned(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_collection_hit() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("util.js", "var x = 1;");
        let resolved = provider.resolve("util.js").unwrap();
        assert_eq!(resolved.text, "var x = 1;");
        assert_eq!(resolved.canonical_name, "util.js");
    }

    #[test]
    fn test_embedded_collection_miss_is_empty() {
        let provider = EmbeddedCollectionProvider::new();
        let resolved = provider.resolve("missing.js").unwrap();
        assert!(resolved.text.is_empty());
    }

    #[test]
    fn test_embedded_collection_strips_quotes() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("a.js", "1;");
        assert_eq!(provider.resolve("\"a.js\"").unwrap().text, "1;");
    }

    #[test]
    fn test_project_folder_missing_file() {
        let provider = ProjectFolderProvider::new("/nonexistent-presto-root");
        let err = provider.resolve("a.js").unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_project_folder_reads_file() {
        let dir = std::env::temp_dir().join("presto_include_test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("inc.js"), "var y = 2;").unwrap();
        let provider = ProjectFolderProvider::new(&dir);
        let resolved = provider.resolve("inc.js").unwrap();
        assert_eq!(resolved.text, "var y = 2;");
        assert!(resolved.canonical_name.ends_with("inc.js"));
    }
}
