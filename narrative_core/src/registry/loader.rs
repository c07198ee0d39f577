//! Reading content files from disk.
//!
//! Layout: one directory per kind under the content root, one JSON record per file.
//! Bad files are reported and skipped; the rest of the content still loads.

use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ContentSet;

/// A content file that could not be used.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ContentError {
    pub fn path(&self) -> &Path {
        match self {
            ContentError::Io { path, .. } | ContentError::Parse { path, .. } => path,
        }
    }
}

/// JSON files directly inside `dir`, sorted by path. A missing directory is empty.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ContentError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ContentError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let json = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_kind<T: DeserializeOwned>(root: &Path, kind: &str, errors: &mut Vec<ContentError>) -> Vec<T> {
    let files = match json_files(&root.join(kind)) {
        Ok(files) => files,
        Err(err) => {
            tracing::warn!(error = %err, kind, "Skipping content directory");
            errors.push(err);
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        match read_record(&path) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping content file");
                errors.push(err);
            }
        }
    }
    records
}

impl ContentSet {
    /// Read `characters/`, `locations/`, `factions/`, `quests/` and `dialogs/`
    /// under `root`. Returns the content that loaded and the files that did not.
    pub fn load_dir(root: &Path) -> (ContentSet, Vec<ContentError>) {
        let mut errors = Vec::new();
        let content = ContentSet {
            characters: load_kind(root, "characters", &mut errors),
            locations: load_kind(root, "locations", &mut errors),
            factions: load_kind(root, "factions", &mut errors),
            quests: load_kind(root, "quests", &mut errors),
            dialogs: load_kind(root, "dialogs", &mut errors),
        };

        tracing::info!(
            root = %root.display(),
            records = content.len(),
            errors = errors.len(),
            "Read content directory"
        );
        (content, errors)
    }
}
