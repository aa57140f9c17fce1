// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Moving document-space annotations into the composited scene.

use std::collections::BTreeMap;

use docxpand_core::Result;
use docxpand_geometry::{BoundingBox, Quadrangle, estimate_homography};
use tracing::debug;

/// Project field boxes given in the rendered document's frame into the scene.
///
/// `document_quad` is the document's own extent (usually
/// `Quadrangle::from_size(w, h)`), `inserted_quad` is where it was placed in
/// the scene. Each box becomes the quadrangle it occupies after insertion.
pub fn transfer_field_positions(
    document_quad: &Quadrangle,
    inserted_quad: &Quadrangle,
    fields: &BTreeMap<String, BoundingBox>,
) -> Result<BTreeMap<String, Quadrangle>> {
    let homography = estimate_homography(document_quad, inserted_quad)?;
    let moved = fields
        .iter()
        .map(|(name, field)| Ok((name.clone(), homography.project_forward(&field.to_quad())?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    debug!(fields = moved.len(), "Field positions transferred");
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use docxpand_geometry::Point;

    use super::*;

    fn assert_quad_near(a: &Quadrangle, b: &Quadrangle) {
        for (p, q) in a.points().iter().zip(b.points().iter()) {
            assert!(p.distance(q) < 1e-6, "{p:?} != {q:?}");
        }
    }

    #[test]
    fn scaled_placement_scales_fields() {
        let doc = Quadrangle::from_size(100.0, 50.0);
        let placed = Quadrangle::from_size(200.0, 100.0).map(|p| Point::new(p.x + 10.0, p.y + 20.0));
        let fields = BTreeMap::from([("name".to_string(), BoundingBox::from_ltrb(10.0, 5.0, 40.0, 15.0))]);

        let moved = transfer_field_positions(&doc, &placed, &fields).unwrap();
        assert_quad_near(&moved["name"], &BoundingBox::from_ltrb(30.0, 30.0, 90.0, 50.0).to_quad());
    }

    #[test]
    fn whole_document_maps_onto_the_placement() {
        let doc = Quadrangle::from_size(80.0, 60.0);
        let placed = Quadrangle::new(
            Point::new(12.0, 8.0),
            Point::new(90.0, 14.0),
            Point::new(85.0, 60.0),
            Point::new(7.0, 55.0),
        );
        let fields = BTreeMap::from([("all".to_string(), BoundingBox::from_ltrb(0.0, 0.0, 80.0, 60.0))]);
        let moved = transfer_field_positions(&doc, &placed, &fields).unwrap();
        assert_quad_near(&moved["all"], &placed);
    }

    #[test]
    fn degenerate_placement_is_rejected() {
        let doc = Quadrangle::from_size(80.0, 60.0);
        let flat = Quadrangle::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        );
        assert!(transfer_field_positions(&doc, &flat, &BTreeMap::new()).is_err());
    }
}
