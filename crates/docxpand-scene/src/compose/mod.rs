// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scene compositing: placing a rendered document into a photographed scene
// so that colour, illumination, and borders match the surroundings.

pub mod color_transfer;
pub mod edges;
pub mod illumination;
pub mod insert;
pub mod rectify;

use docxpand_core::{CompositorConfig, Margins, Result};
use docxpand_geometry::{Quadrangle, estimate_homography};
use tracing::{info, instrument};

pub use color_transfer::{ChannelStats, color_transfer_reinhard};
pub use edges::{blur_document_edges, edge_width};
pub use illumination::illumination_transfer;
pub use insert::{alpha_composite, insert_image_in_background};
pub use rectify::rectify_document;

use crate::faces::{FaceDetector, NoFaceDetector, face_regions};
use crate::image::Image;

/// A composited scene and the quadrangle the document actually occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub image: Image,
    /// Destination quadrangle after margins, in scene pixels.
    pub quad: Quadrangle,
}

/// Runs the full document-in-scene pipeline with a fixed configuration.
///
/// The compositor holds no per-call state and can be shared across threads.
pub struct SceneCompositor {
    config: CompositorConfig,
    detector: Box<dyn FaceDetector + Send + Sync>,
}

impl SceneCompositor {
    /// Compositor without face detection.
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            config,
            detector: Box::new(NoFaceDetector),
        }
    }

    /// Replace the face detector used by the illumination stage.
    pub fn with_detector(mut self, detector: impl FaceDetector + Send + Sync + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Insert `document` into `scene` at `target_quad`.
    ///
    /// The scene region under `target_quad` is rectified and serves, together
    /// with `specimen`, as the reference for colour and illumination
    /// matching. With `margins`, the destination is `target_quad` enlarged in
    /// its own perspective and clipped to the scene. Any failure aborts the
    /// whole composite; only face detection degrades silently.
    #[instrument(
        skip_all,
        fields(
            scene = ?scene.dimensions(),
            document = ?document.dimensions(),
            margins = margins.is_some(),
        )
    )]
    pub fn composite(
        &self,
        scene: &Image,
        document: &Image,
        specimen: &Image,
        target_quad: &Quadrangle,
        margins: Option<Margins>,
    ) -> Result<Composite> {
        let config = &self.config;
        let (scene_w, scene_h) = scene.dimensions();

        let reference = rectify_document(scene, target_quad, config.target_width, config.parallel_epsilon)?;
        let colored = color_transfer_reinhard(&reference, specimen, document)?;
        let faces = face_regions(&*self.detector, &colored, config.face_margins);
        let lit = illumination_transfer(&reference, specimen, &colored, &faces, &config.illumination)?;

        let quad = match margins {
            Some(margins) => target_quad.enlarge_with_epsilon(
                margins,
                (scene_w, scene_h),
                config.target_width,
                config.parallel_epsilon,
            )?,
            None => *target_quad,
        };
        let placement = estimate_homography(
            &Quadrangle::from_size(lit.width() as f64, lit.height() as f64),
            &quad,
        )?;
        let image = insert_image_in_background(scene, &lit, &placement, &quad, &config.edges)?;

        info!(faces = faces.len(), detector = self.detector.name(), "Document composited");
        Ok(Composite { image, quad })
    }
}

impl Default for SceneCompositor {
    fn default() -> Self {
        Self::new(CompositorConfig::default())
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use docxpand_core::{ColorSpace, DocxpandError};
    use docxpand_geometry::{BoundingBox, Point};

    use super::*;

    fn scene() -> Image {
        Image::from_fn(220, 160, ColorSpace::Rgb, |x, y| {
            vec![(x % 256) as u8, (y + 40) as u8, ((x + y) / 3) as u8]
        })
        .unwrap()
    }

    fn specimen() -> Image {
        Image::from_fn(30, 20, ColorSpace::Rgb, |x, y| vec![150 + x as u8, 140 + y as u8, 120])
            .unwrap()
    }

    fn target() -> Quadrangle {
        Quadrangle::new(
            Point::new(40.0, 40.0),
            Point::new(160.0, 40.0),
            Point::new(160.0, 120.0),
            Point::new(40.0, 120.0),
        )
    }

    fn opaque_document() -> Image {
        Image::from_fn(60, 40, ColorSpace::Rgb, |x, y| vec![200, (x * 4) as u8, (y * 6) as u8]).unwrap()
    }

    /// Records the size of every image it is asked to inspect.
    #[derive(Default, Clone)]
    struct Recording(Arc<Mutex<Vec<(u32, u32)>>>);

    impl FaceDetector for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn detect(&self, image: &Image) -> Result<Vec<BoundingBox>> {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(image.dimensions());
            }
            Ok(vec![BoundingBox::from_ltrb(5.0, 5.0, 20.0, 25.0)])
        }
    }

    struct Broken;

    impl FaceDetector for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _image: &Image) -> Result<Vec<BoundingBox>> {
            Err(DocxpandError::FaceDetection("unavailable".into()))
        }
    }

    #[test]
    fn composite_keeps_scene_outside_the_document() {
        let scene = scene();
        let out = SceneCompositor::default()
            .composite(&scene, &opaque_document(), &specimen(), &target(), None)
            .unwrap();
        assert_eq!(out.quad, target());
        assert_eq!(out.image.dimensions(), scene.dimensions());
        assert_eq!(out.image.space(), ColorSpace::Rgb);
        for (x, y) in [(5, 5), (215, 155), (100, 10), (20, 80), (180, 140)] {
            assert_eq!(out.image.pixel(x, y), scene.pixel(x, y), "pixel ({x}, {y})");
        }
    }

    #[test]
    fn transparent_document_leaves_scene_untouched() {
        let scene = scene();
        let document = Image::from_pixel(60, 40, ColorSpace::Rgba, &[255, 0, 0, 0]).unwrap();
        let out = SceneCompositor::default()
            .composite(&scene, &document, &specimen(), &target(), None)
            .unwrap();
        assert_eq!(out.image, scene);
    }

    #[test]
    fn margins_enlarge_the_destination() {
        let scene = scene();
        let margins = Margins::Uniform(10.0);
        let out = SceneCompositor::default()
            .composite(&scene, &opaque_document(), &specimen(), &target(), Some(margins))
            .unwrap();
        let expected = target().enlarge(margins, (220u32, 160u32), 720).unwrap();
        assert_eq!(out.quad, expected);

        let grown = BoundingBox::from_quad(&out.quad);
        let before = BoundingBox::from_quad(&target());
        assert!(grown.left() < before.left() && grown.right() > before.right());
        assert!(grown.top() < before.top() && grown.bottom() > before.bottom());
    }

    #[test]
    fn margins_follow_the_configured_parallel_epsilon() {
        let scene = scene();
        let config = CompositorConfig {
            parallel_epsilon: 0.5,
            ..CompositorConfig::default()
        };
        let tilted = Quadrangle::new(
            Point::new(40.0, 35.0),
            Point::new(170.0, 45.0),
            Point::new(165.0, 125.0),
            Point::new(45.0, 115.0),
        );
        let margins = Margins::Uniform(0.1);
        let out = SceneCompositor::new(config)
            .composite(&scene, &opaque_document(), &specimen(), &tilted, Some(margins))
            .unwrap();
        let expected = tilted.enlarge_with_epsilon(margins, (220u32, 160u32), 720, 0.5).unwrap();
        assert_eq!(out.quad, expected);
    }

    #[test]
    fn detector_sees_the_recoloured_document() {
        let recording = Recording::default();
        let compositor = SceneCompositor::default().with_detector(recording.clone());
        compositor
            .composite(&scene(), &opaque_document(), &specimen(), &target(), None)
            .unwrap();
        assert_eq!(*recording.0.lock().unwrap(), vec![(60, 40)]);
    }

    #[test]
    fn detector_failure_does_not_abort() {
        let compositor = SceneCompositor::default().with_detector(Broken);
        let out = compositor.composite(&scene(), &opaque_document(), &specimen(), &target(), None);
        assert!(out.is_ok());
    }

    #[test]
    fn degenerate_target_fails() {
        let flat = Quadrangle::new(
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(130.0, 10.0),
        );
        let err = SceneCompositor::default()
            .composite(&scene(), &opaque_document(), &specimen(), &flat, None)
            .unwrap_err();
        assert!(matches!(err, DocxpandError::DegenerateGeometry(_)));
    }
}
