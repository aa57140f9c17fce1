// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference specimens of real document types, loaded from a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docxpand_core::{DocxpandError, Result};
use tracing::{debug, info};

use crate::image::Image;

/// Specimen images keyed by document-type name.
///
/// Loading is explicit: call [`SpecimenCache::load`] (or
/// [`SpecimenCache::preload`]) up front, then share the cache read-only.
#[derive(Debug, Clone)]
pub struct SpecimenCache {
    root: PathBuf,
    images: HashMap<String, Image>,
}

impl SpecimenCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of the specimen for `name`: lower-cased, underscores
    /// replaced by dashes, `.jpg` extension.
    pub fn file_name(name: &str) -> String {
        format!("{}.jpg", name.to_lowercase().replace('_', "-"))
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(Self::file_name(name))
    }

    /// Load `name` from disk unless it is already cached.
    pub fn load(&mut self, name: &str) -> Result<&Image> {
        if !self.images.contains_key(name) {
            let path = self.path_for(name);
            if !path.is_file() {
                return Err(DocxpandError::SpecimenNotFound(path.display().to_string()));
            }
            let image = Image::open(&path)?;
            debug!(name, path = %path.display(), width = image.width(), height = image.height(), "Specimen loaded");
            self.images.insert(name.to_string(), image);
        }
        self.get(name)
    }

    /// Load every name in `names`, stopping at the first missing one.
    pub fn preload<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.load(name)?;
        }
        info!(count = self.images.len(), root = %self.root.display(), "Specimens ready");
        Ok(())
    }

    /// A previously loaded specimen.
    pub fn get(&self, name: &str) -> Result<&Image> {
        self.images
            .get(name)
            .ok_or_else(|| DocxpandError::SpecimenNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

// -- Tests --------------------------------------------------------------------
