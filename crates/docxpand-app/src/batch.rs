// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch insertion of rendered documents into photographed scenes.
//
// Each document is paired with a scene, composited on a rayon worker, and
// written as `<stem>.jpg`. A failed document is logged and left out; the
// rest of the batch continues. Successful composites are listed in
// `annotations.json` next to the images.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use docxpand_core::{ColorSpace, CompositorConfig, DocxpandError, Margins, Result};
use docxpand_geometry::Quadrangle;
use docxpand_scene::{Image, SceneCompositor, SpecimenCache};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::manifest::{SceneEntry, list_documents, load_manifest};

/// Name of the annotation listing written to the output directory.
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct InsertOptions {
    pub scene_manifest: PathBuf,
    pub scene_dir: PathBuf,
    pub document_dir: PathBuf,
    pub specimen_dir: PathBuf,
    pub output_dir: PathBuf,
    pub margins: Option<Margins>,
    pub seed: Option<u64>,
    pub config: CompositorConfig,
}

/// Annotation of one composited document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertedDocument {
    /// Document identifier (source file stem).
    pub id: String,
    /// Composited image, relative to the output directory.
    pub filename: String,
    pub scene_id: String,
    /// Final document corners normalised by the scene size.
    pub position: Quadrangle,
    pub template: String,
    pub updated_at: DateTime<Utc>,
}

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: usize,
    pub failed: usize,
}

/// Scene index for each of `documents` documents.
///
/// The scene order is reshuffled at the start of every pass over the
/// `scenes` scenes, so each scene is used once per pass. A seed makes the
/// assignment reproducible.
pub fn assign_scenes(documents: usize, scenes: usize, seed: Option<u64>) -> Vec<usize> {
    if scenes == 0 {
        return Vec::new();
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<usize> = (0..scenes).collect();
    (0..documents)
        .map(|idx| {
            if idx % scenes == 0 {
                order.shuffle(&mut rng);
            }
            order[idx % scenes]
        })
        .collect()
}

/// Run a full batch. Fails up front when the output directory already holds
/// an annotation listing or when inputs cannot be read; per-document
/// failures only show up in the summary.
#[instrument(skip_all, fields(output = %options.output_dir.display()))]
pub fn run_insert(options: &InsertOptions) -> Result<BatchSummary> {
    std::fs::create_dir_all(&options.output_dir)?;
    let annotations_path = options.output_dir.join(ANNOTATIONS_FILE);
    if annotations_path.exists() {
        return Err(DocxpandError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "{} already exists; choose a new output directory or remove it",
                annotations_path.display()
            ),
        )));
    }

    let scenes = load_manifest(&options.scene_manifest)?;
    let listed = list_documents(&options.document_dir)?;
    let total = listed.len();
    let documents = drop_duplicate_stems(listed);
    let assignment = assign_scenes(documents.len(), scenes.len(), options.seed);

    let specimens = load_specimens(&options.specimen_dir, &scenes, &assignment);
    let compositor = SceneCompositor::new(options.config.clone());

    let results: Vec<Option<InsertedDocument>> = documents
        .par_iter()
        .zip(assignment.par_iter())
        .map(|(document, &scene_idx)| {
            let scene = &scenes[scene_idx];
            match insert_one(&compositor, &specimens, options, document, scene) {
                Ok(inserted) => Some(inserted),
                Err(err) => {
                    warn!(document = %document.display(), scene = %scene.id, %err, "Document skipped");
                    None
                }
            }
        })
        .collect();

    let inserted: Vec<InsertedDocument> = results.into_iter().flatten().collect();
    let summary = BatchSummary {
        inserted: inserted.len(),
        failed: total - inserted.len(),
    };
    std::fs::write(&annotations_path, serde_json::to_string_pretty(&inserted)?)?;
    info!(
        inserted = summary.inserted,
        failed = summary.failed,
        annotations = %annotations_path.display(),
        "Batch finished"
    );
    Ok(summary)
}

/// Keep the first document of each file stem. Later documents with the same
/// stem would overwrite its `<stem>.jpg`, so they are skipped as failures.
fn drop_duplicate_stems(documents: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut stems = HashSet::new();
    documents
        .into_iter()
        .filter(|path| match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stems.insert(stem.to_string()) => {
                warn!(document = %path.display(), stem, "Document skipped: duplicate file stem");
                false
            }
            _ => true,
        })
        .collect()
}

/// Rendered documents are made opaque RGBA, so dark pixels are never taken
/// for transparent ones.
fn load_document(path: &Path) -> Result<Image> {
    Ok(Image::open(path)?.convert(ColorSpace::Rgba))
}

/// Load the specimen of every scene that will be used. A missing specimen is
/// only reported here; documents needing it fail individually later.
fn load_specimens(dir: &Path, scenes: &[SceneEntry], assignment: &[usize]) -> SpecimenCache {
    let mut cache = SpecimenCache::new(dir);
    let templates: BTreeSet<&str> = assignment.iter().map(|&i| scenes[i].template.as_str()).collect();
    for template in templates {
        if let Err(err) = cache.load(template) {
            warn!(template, %err, "Specimen unavailable");
        }
    }
    cache
}

fn insert_one(
    compositor: &SceneCompositor,
    specimens: &SpecimenCache,
    options: &InsertOptions,
    document_path: &Path,
    scene: &SceneEntry,
) -> Result<InsertedDocument> {
    let stem = document_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DocxpandError::invalid(format!("bad document name {}", document_path.display())))?
        .to_string();

    let document = load_document(document_path)?;
    let scene_image = Image::open_oriented(options.scene_dir.join(&scene.filename))?;
    let specimen = specimens.get(&scene.template)?;

    let (width, height) = (scene_image.width() as f64, scene_image.height() as f64);
    let target = scene.position.rescale(width, height);
    let composite = compositor.composite(&scene_image, &document, specimen, &target, options.margins)?;

    let filename = format!("{stem}.jpg");
    composite
        .image
        .save(options.output_dir.join(&filename), compositor.config().jpeg_quality)?;

    Ok(InsertedDocument {
        id: stem,
        filename,
        scene_id: scene.id.clone(),
        position: composite.quad.normalize(width, height),
        template: scene.template.clone(),
        updated_at: Utc::now(),
    })
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use docxpand_geometry::Point;

    use super::*;

    #[test]
    fn every_pass_uses_each_scene_once() {
        let assignment = assign_scenes(10, 4, Some(7));
        assert_eq!(assignment.len(), 10);
        for pass in assignment.chunks(4) {
            let mut seen = pass.to_vec();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), pass.len());
        }
    }

    #[test]
    fn seeded_assignment_is_reproducible() {
        assert_eq!(assign_scenes(25, 6, Some(42)), assign_scenes(25, 6, Some(42)));
    }

    #[test]
    fn no_scenes_means_no_assignment() {
        assert!(assign_scenes(3, 0, Some(1)).is_empty());
    }

    /// Scene, specimen, and document directories with one good document and
    /// one undecodable one.
    fn fixture(root: &Path) -> InsertOptions {
        let scene_dir = root.join("scenes");
        let document_dir = root.join("documents");
        let specimen_dir = root.join("specimens");
        for dir in [&scene_dir, &document_dir, &specimen_dir] {
            std::fs::create_dir_all(dir).unwrap();
        }

        Image::from_fn(120, 90, ColorSpace::Rgb, |x, y| vec![(x * 2) as u8, (y * 2) as u8, 90])
            .unwrap()
            .save(scene_dir.join("desk.jpg"), 95)
            .unwrap();
        Image::from_pixel(24, 18, ColorSpace::Rgb, &[200, 190, 170])
            .unwrap()
            .save(specimen_dir.join("card-a.jpg"), 95)
            .unwrap();
        Image::from_fn(40, 30, ColorSpace::Rgba, |x, _| vec![220, 200, (x * 5) as u8, 255])
            .unwrap()
            .save(document_dir.join("good.png"), 95)
            .unwrap();
        std::fs::write(document_dir.join("broken.png"), b"not an image").unwrap();

        let scenes = vec![SceneEntry {
            id: "scene-1".into(),
            filename: "desk.jpg".into(),
            position: Quadrangle::new(
                Point::new(0.2, 0.2),
                Point::new(0.8, 0.2),
                Point::new(0.8, 0.8),
                Point::new(0.2, 0.8),
            ),
            template: "CARD_A".into(),
        }];
        let scene_manifest = root.join("scenes.json");
        std::fs::write(&scene_manifest, serde_json::to_string(&scenes).unwrap()).unwrap();

        InsertOptions {
            scene_manifest,
            scene_dir,
            document_dir,
            specimen_dir,
            output_dir: root.join("out"),
            margins: None,
            seed: Some(3),
            config: CompositorConfig::default(),
        }
    }

    #[test]
    fn batch_writes_images_and_annotations() {
        let root = tempfile::tempdir().unwrap();
        let options = fixture(root.path());

        let summary = run_insert(&options).unwrap();
        assert_eq!(summary, BatchSummary { inserted: 1, failed: 1 });

        let out = &options.output_dir;
        assert!(out.join("good.jpg").is_file());
        assert!(!out.join("broken.jpg").exists());
        assert_eq!(Image::open(out.join("good.jpg")).unwrap().dimensions(), (120, 90));

        let raw = std::fs::read_to_string(out.join(ANNOTATIONS_FILE)).unwrap();
        let annotations: Vec<InsertedDocument> = serde_json::from_str(&raw).unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id, "good");
        assert_eq!(annotations[0].filename, "good.jpg");
        assert_eq!(annotations[0].scene_id, "scene-1");
        assert_eq!(annotations[0].template, "CARD_A");
        let p1 = annotations[0].position.p1;
        assert!((p1.x - 0.2).abs() < 1e-9 && (p1.y - 0.2).abs() < 1e-9, "{p1:?}");
    }

    #[test]
    fn rgb_document_keeps_its_black_text() {
        let root = tempfile::tempdir().unwrap();
        let options = fixture(root.path());
        Image::from_fn(40, 30, ColorSpace::Rgb, |_, y| {
            if (12..18).contains(&y) {
                vec![0, 0, 0]
            } else {
                vec![220, 200, 180]
            }
        })
        .unwrap()
        .save(options.document_dir.join("text.png"), 95)
        .unwrap();

        let document = load_document(&options.document_dir.join("text.png")).unwrap();
        assert_eq!(document.space(), ColorSpace::Rgba);
        assert_eq!(document.pixel(20, 15), &[0, 0, 0, 255]);

        let summary = run_insert(&options).unwrap();
        assert_eq!(summary, BatchSummary { inserted: 2, failed: 1 });

        // Scene pixel (60, 45) is about [120, 90, 90]; the band lands there.
        let out = Image::open(options.output_dir.join("text.jpg")).unwrap();
        let band = out.pixel(60, 45);
        assert!(band.iter().all(|&c| c < 60), "{band:?}");
    }

    #[test]
    fn duplicate_stems_keep_only_the_first_document() {
        let root = tempfile::tempdir().unwrap();
        let options = fixture(root.path());
        Image::from_pixel(40, 30, ColorSpace::Rgb, &[30, 60, 200])
            .unwrap()
            .save(options.document_dir.join("good.bmp"), 95)
            .unwrap();

        let summary = run_insert(&options).unwrap();
        assert_eq!(summary, BatchSummary { inserted: 1, failed: 2 });

        let raw = std::fs::read_to_string(options.output_dir.join(ANNOTATIONS_FILE)).unwrap();
        let annotations: Vec<InsertedDocument> = serde_json::from_str(&raw).unwrap();
        let names: Vec<&str> = annotations.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, ["good.jpg"]);

        let files = std::fs::read_dir(&options.output_dir).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn existing_annotations_block_the_run() {
        let root = tempfile::tempdir().unwrap();
        let options = fixture(root.path());
        run_insert(&options).unwrap();

        let err = run_insert(&options).unwrap_err();
        assert!(matches!(err, DocxpandError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));
    }

    #[test]
    fn missing_specimen_fails_documents_not_the_batch() {
        let root = tempfile::tempdir().unwrap();
        let options = fixture(root.path());
        std::fs::remove_file(options.specimen_dir.join("card-a.jpg")).unwrap();

        let summary = run_insert(&options).unwrap();
        assert_eq!(summary, BatchSummary { inserted: 0, failed: 2 });
        let raw = std::fs::read_to_string(options.output_dir.join(ANNOTATIONS_FILE)).unwrap();
        assert_eq!(raw.trim(), "[]");
    }
}
