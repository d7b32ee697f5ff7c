//! JSON persistence for graph snapshots.
//!
//! Loading always re-runs the defaulting pipeline; saving is a direct
//! pretty-printed serialization.

use crate::autocomplete::autocomplete;
use nav_types::{Graph, SUPPORTED_MAJOR_VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid graph JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize graph: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("unsupported schema version '{version}' (supported major version: {supported})")]
    UnsupportedVersion { version: String, supported: u64 },

    /// A store key disagrees with the entity's own id.
    #[error("{store} key '{key}' does not match entity id '{id}'")]
    IdMismatch {
        store: &'static str,
        key: String,
        id: String,
    },
}

impl PersistError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            Self::IdMismatch { .. } => "ID_MISMATCH",
        }
    }
}

/// Parse a graph and run the pipeline over it.
pub fn load_json(json: &str) -> Result<Graph, PersistError> {
    let graph: Graph = serde_json::from_str(json).map_err(PersistError::Parse)?;
    check_version(&graph.version)?;
    check_keys(&graph)?;

    let completed = autocomplete(&graph);
    tracing::info!(
        version = %completed.version,
        buildings = completed.buildings.len(),
        floors = completed.floors.len(),
        nodes = completed.nodes.len(),
        edges = completed.edges.len(),
        spaces = completed.spaces.len(),
        "graph loaded"
    );
    Ok(completed)
}

/// Pretty-printed JSON.
pub fn save_json(graph: &Graph) -> Result<String, PersistError> {
    serde_json::to_string_pretty(graph).map_err(PersistError::Serialize)
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Graph, PersistError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_json(&json)
}

pub fn save_file(graph: &Graph, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    let json = save_json(graph)?;
    fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "graph saved");
    Ok(())
}

fn check_version(version: &str) -> Result<(), PersistError> {
    let major = version
        .split('.')
        .next()
        .and_then(|m| m.trim().parse::<u64>().ok());
    match major {
        Some(SUPPORTED_MAJOR_VERSION) => Ok(()),
        _ => Err(PersistError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_MAJOR_VERSION,
        }),
    }
}

fn check_keys(graph: &Graph) -> Result<(), PersistError> {
    fn mismatch<K: ToString, I: ToString>(store: &'static str, key: &K, id: &I) -> PersistError {
        PersistError::IdMismatch {
            store,
            key: key.to_string(),
            id: id.to_string(),
        }
    }

    if let Some((k, v)) = graph.buildings.iter().find(|(k, v)| **k != v.id) {
        return Err(mismatch("buildings", k, &v.id));
    }
    if let Some((k, v)) = graph.floors.iter().find(|(k, v)| **k != v.id) {
        return Err(mismatch("floors", k, &v.id));
    }
    if let Some((k, v)) = graph.nodes.iter().find(|(k, v)| **k != v.id) {
        return Err(mismatch("nodes", k, &v.id));
    }
    if let Some((k, v)) = graph.edges.iter().find(|(k, v)| **k != v.id) {
        return Err(mismatch("edges", k, &v.id));
    }
    if let Some((k, v)) = graph.spaces.iter().find(|(k, v)| **k != v.id) {
        return Err(mismatch("spaces", k, &v.id));
    }
    Ok(())
}
