//! Reference host: documents on disk.
//!
//! Loads every matching file under a root directory into a [`Catalog`],
//! writes a patched catalog back out, and derives the known-identifier set
//! from the directory layout and the patches themselves.

use std::fs;
use std::path::{Component, Path};

use confpatch_pattern::{parse_pass_specifier, PassSpecifier};
use confpatch_tree::{document_to_text, parse_document};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::config::{ConfigError, EngineConfig};
use crate::error::EngineError;
use crate::known::KnownIdentifiers;

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::InvalidGlob {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}

/// `a/b/c.cfg` with forward slashes, whatever the platform.
fn relative_url(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl Catalog {
    /// Load every file under `root` selected by the include patterns.
    ///
    /// Files are visited in sorted path order. The first path component is
    /// the collection; files directly under `root` have none.
    pub fn load_dir(root: &Path, config: &EngineConfig) -> Result<Catalog, EngineError> {
        let include = build_globset(&config.include)?;
        let mut catalog = Catalog::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !config
                        .exclude_dirs
                        .iter()
                        .any(|d| entry.file_name().to_string_lossy() == d.as_str())
            });

        for entry in walker {
            let entry = entry.map_err(|e| EngineError::Io {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let url = relative_url(relative);
            if !include.is_match(&url) {
                continue;
            }

            let text = fs::read_to_string(entry.path()).map_err(|source| EngineError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let documents = parse_document(&text).map_err(|source| EngineError::Codec {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let collection = match url.split_once('/') {
                Some((first, _)) => first.to_string(),
                None => String::new(),
            };
            debug!(%url, documents = documents.len(), "loaded file");
            let file = catalog.add_file(url, collection);
            for document in documents {
                catalog.add_document(file, document);
            }
        }

        info!(
            root = %root.display(),
            files = catalog.file_count(),
            documents = catalog.document_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Write each file's documents to `root/<url>`.
    pub fn write_dir(&self, root: &Path) -> Result<(), EngineError> {
        for file in self.files() {
            let path = root.join(&file.url);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| EngineError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, document_to_text(&file.documents))
                .map_err(|source| EngineError::Io { path, source })?;
        }
        Ok(())
    }
}

impl KnownIdentifiers {
    /// Collection names, configured extras, and `:FOR[x]` names found on
    /// root documents.
    pub fn discover(catalog: &Catalog, config: &EngineConfig) -> KnownIdentifiers {
        let mut known = KnownIdentifiers::new();
        if config.include_directory_identifiers {
            known.extend(
                catalog
                    .files()
                    .iter()
                    .map(|f| f.collection.clone())
                    .filter(|c| !c.is_empty()),
            );
        }
        known.extend(config.extra_identifiers.iter().cloned());
        if config.register_for_identifiers {
            for (_, node) in catalog.documents() {
                if let Ok(Some(PassSpecifier::For(id))) = parse_pass_specifier(&node.name) {
                    known.insert(id);
                }
            }
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_url() {
        assert_eq!(relative_url(Path::new("Squad/Parts/probe.cfg")), "Squad/Parts/probe.cfg");
        assert_eq!(relative_url(Path::new("./top.cfg")), "top.cfg");
    }

    #[test]
    fn test_discover_sources() {
        let catalog = Catalog::new()
            .with_file("Squad/a.cfg", "Squad", Vec::new())
            .with_file(
                "top.cfg",
                "",
                confpatch_tree::parse_document("@PART:FOR[MyMod] {}\n@PART:AFTER[Other] {}").unwrap(),
            );
        let config = EngineConfig {
            extra_identifiers: vec!["Extra".to_string()],
            ..EngineConfig::default()
        };
        let known = KnownIdentifiers::discover(&catalog, &config);
        assert!(known.contains("squad"));
        assert!(known.contains("MyMod"));
        assert!(known.contains("Extra"));
        assert!(!known.contains("Other"));

        let config = EngineConfig {
            include_directory_identifiers: false,
            register_for_identifiers: false,
            ..EngineConfig::default()
        };
        assert!(KnownIdentifiers::discover(&catalog, &config).is_empty());
    }
}
