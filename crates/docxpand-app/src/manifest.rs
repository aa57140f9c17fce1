// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch inputs: the scene manifest and the directory of rendered documents.

use std::path::{Path, PathBuf};

use docxpand_core::{DocxpandError, Result};
use docxpand_geometry::Quadrangle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// File extensions accepted as rendered documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

/// One photographed scene and where a document lies in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub id: String,
    /// Image file, relative to the scene directory.
    pub filename: String,
    /// Document corners normalised to `[0, 1]` by the scene size.
    pub position: Quadrangle,
    /// Document type shown in the scene; selects the specimen.
    pub template: String,
}

/// Read a JSON list of scene entries.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<SceneEntry>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let scenes: Vec<SceneEntry> = serde_json::from_str(&raw)?;
    if scenes.is_empty() {
        return Err(DocxpandError::invalid(format!(
            "scene manifest {} lists no scenes",
            path.display()
        )));
    }
    info!(path = %path.display(), scenes = scenes.len(), "Scene manifest loaded");
    Ok(scenes)
}

/// Raster images directly inside `dir`, sorted by file name.
pub fn list_documents(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_raster(&path) {
            documents.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-document entry");
        }
    }
    documents.sort();
    info!(dir = %dir.display(), documents = documents.len(), "Documents found");
    Ok(documents)
}

fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

// -- Tests --------------------------------------------------------------------
