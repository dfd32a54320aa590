use glam::Mat4;

use crate::camera::Camera;
use crate::labeling::bounding_box::BoundingBox;
use crate::model::Model;

/// Outcome of projecting one object into the camera view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Accepted(BoundingBox),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The mesh has no vertices to project.
    EmptyMesh,
    /// No projected extent falls inside the frame.
    OutsideView,
    /// The clipped box is narrower or shorter than the threshold.
    BelowThreshold,
}

/// Computes the normalized 2D bounding box of `model` under `world` as seen
/// by `camera`.
///
/// The visibility test is a coarse any-extent-in-range check, not a frustum
/// or occlusion test: an object wrapping around the view through off-screen
/// excursions (e.g. directly behind the camera under an extreme field of
/// view) can still be accepted. Known approximation, kept for compatibility
/// with the label sets this tool has always produced.
pub fn project(model: &Model, world: Mat4, camera: &Camera, threshold: f32) -> Projection {
    if model.positions.is_empty() {
        return Projection::Rejected(RejectReason::EmptyMesh);
    }

    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for &position in &model.positions {
        let view = camera.world_to_view(world.transform_point3(position));

        // The projection has v = 0 at the bottom of the frame; labels want
        // y = 0 at the top.
        let x = view.x;
        let y = 1.0 - view.y;

        // f32::min/max ignore NaN operands, so non-finite projections
        // (vertex on the camera plane) never count toward the extents.
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let in_frame = [min_x, max_x, min_y, max_y]
        .iter()
        .any(|extent| (0.0..=1.0).contains(extent));
    if !in_frame {
        return Projection::Rejected(RejectReason::OutsideView);
    }

    // Truncate boxes that extend past the frame edge to the visible area.
    let min_x = min_x.max(0.0);
    let max_x = max_x.min(1.0);
    let min_y = min_y.max(0.0);
    let max_y = max_y.min(1.0);

    let width = max_x - min_x;
    let height = max_y - min_y;

    // Even a zero threshold never lets an empty box through.
    if width < threshold || height < threshold || width <= 0.0 || height <= 0.0 {
        return Projection::Rejected(RejectReason::BelowThreshold);
    }

    Projection::Accepted(BoundingBox {
        x_center: (min_x + max_x) / 2.0,
        y_center: (min_y + max_y) / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Lens;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn unit_cube() -> Model {
        let mut positions = Vec::new();
        for &x in &[-0.5, 0.5] {
            for &y in &[-0.5, 0.5] {
                for &z in &[-0.5, 0.5] {
                    positions.push(Vec3::new(x, y, z));
                }
            }
        }
        Model {
            name: "cube".to_string(),
            positions,
        }
    }

    fn front_camera() -> Camera {
        Camera::look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            Lens {
                yfov: FRAC_PI_2,
                aspect: 1.0,
                znear: 0.1,
                zfar: Some(100.0),
            },
        )
    }

    #[test]
    fn visible_cube_is_centered_in_frame() {
        let bbox = match project(&unit_cube(), Mat4::IDENTITY, &front_camera(), 0.01) {
            Projection::Accepted(bbox) => bbox,
            Projection::Rejected(reason) => panic!("expected a box, got {:?}", reason),
        };

        assert!((bbox.x_center - 0.5).abs() < 1e-4);
        assert!((bbox.y_center - 0.5).abs() < 1e-4);
        assert!(bbox.width > 0.05 && bbox.width < 0.5);
        assert!(bbox.height > 0.05 && bbox.height < 0.5);
    }

    #[test]
    fn cube_far_outside_the_frustum_is_rejected() {
        let world = Mat4::from_translation(Vec3::new(1000.0, 0.0, 0.0));
        assert_eq!(
            project(&unit_cube(), world, &front_camera(), 0.01),
            Projection::Rejected(RejectReason::OutsideView)
        );
    }

    #[test]
    fn cube_far_behind_the_camera_is_rejected() {
        // Behind the camera the perspective divide mirrors points toward the
        // frame center, so it is the size gate, not the visibility gate,
        // that ends up rejecting — the wrap-around case the visibility test
        // is documented not to catch.
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, 100.0));
        assert!(matches!(
            project(&unit_cube(), world, &front_camera(), 0.01),
            Projection::Rejected(_)
        ));
    }

    #[test]
    fn sub_threshold_box_is_rejected_even_when_visible() {
        let world = Mat4::from_scale(Vec3::splat(0.01));
        assert_eq!(
            project(&unit_cube(), world, &front_camera(), 0.05),
            Projection::Rejected(RejectReason::BelowThreshold)
        );
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let model = Model {
            name: "empty".to_string(),
            positions: Vec::new(),
        };
        assert_eq!(
            project(&model, Mat4::IDENTITY, &front_camera(), 0.01),
            Projection::Rejected(RejectReason::EmptyMesh)
        );
    }

    #[test]
    fn partially_visible_box_is_clipped_to_the_frame() {
        // Slide the cube left until part of it leaves the view.
        let world = Mat4::from_translation(Vec3::new(-4.6, 0.0, 0.0));
        let bbox = match project(&unit_cube(), world, &front_camera(), 0.001) {
            Projection::Accepted(bbox) => bbox,
            Projection::Rejected(reason) => panic!("expected a box, got {:?}", reason),
        };

        let min_x = bbox.x_center - bbox.width / 2.0;
        assert!(min_x >= 0.0);
        assert!(bbox.width > 0.0);
    }

    #[test]
    fn accepted_boxes_satisfy_output_invariants() {
        let offsets = [
            Vec3::ZERO,
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(-3.0, -2.0, 1.0),
            Vec3::new(-4.6, 0.0, 0.0),
        ];

        for offset in offsets {
            if let Projection::Accepted(bbox) =
                project(&unit_cube(), Mat4::from_translation(offset), &front_camera(), 0.001)
            {
                assert!((0.0..=1.0).contains(&bbox.x_center));
                assert!((0.0..=1.0).contains(&bbox.y_center));
                assert!(bbox.width > 0.0);
                assert!(bbox.height > 0.0);
            }
        }
    }

    #[test]
    fn zero_threshold_still_rejects_degenerate_boxes() {
        let model = Model {
            name: "point".to_string(),
            positions: vec![Vec3::ZERO],
        };
        assert_eq!(
            project(&model, Mat4::IDENTITY, &front_camera(), 0.0),
            Projection::Rejected(RejectReason::BelowThreshold)
        );
    }

    #[test]
    fn degenerate_projection_does_not_propagate_nan() {
        // Every vertex sits on the camera plane, so u and v are non-finite.
        let model = Model {
            name: "plane".to_string(),
            positions: vec![Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 5.0)],
        };
        assert_eq!(
            project(&model, Mat4::IDENTITY, &front_camera(), 0.01),
            Projection::Rejected(RejectReason::OutsideView)
        );
    }
}
