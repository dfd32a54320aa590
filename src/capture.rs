use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

use crate::camera::Camera;
use crate::scene_graph::scene::Scene;

/// Image capture backend invoked once per exported frame. The exporter
/// decides the path; the backend decides the format and does the writing.
pub trait Capture {
    /// File extension (without the dot) of the images this backend writes.
    fn extension(&self) -> &str;

    fn capture(&self, scene: &Scene, camera: &Camera, path: &Path) -> Result<()>;
}

/// Claims success without writing anything. For label-only runs and tests
/// that provide their own image files.
pub struct NullCapture;

impl Capture for NullCapture {
    fn extension(&self) -> &str {
        "png"
    }

    fn capture(&self, _scene: &Scene, _camera: &Camera, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Splats every projected mesh vertex into a PNG, white on black. A
/// debugging aid for checking exported labels by eye, not a renderer.
pub struct PointCloudCapture {
    pub width: u32,
    pub height: u32,
}

impl Default for PointCloudCapture {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Capture for PointCloudCapture {
    fn extension(&self) -> &str {
        "png"
    }

    fn capture(&self, scene: &Scene, camera: &Camera, path: &Path) -> Result<()> {
        let mut image = RgbImage::new(self.width, self.height);

        for (_, object) in scene.objects.iter() {
            let Some(model_id) = object.model_id else {
                continue;
            };
            let Some(model) = scene.models.get(model_id) else {
                continue;
            };
            let world = *object.transform.get_world_matrix();

            for &position in &model.positions {
                let view = camera.world_to_view(world.transform_point3(position));
                if view.z <= 0.0 || !view.x.is_finite() || !view.y.is_finite() {
                    continue;
                }

                let x = (view.x * self.width as f32) as i64;
                let y = ((1.0 - view.y) * self.height as f32) as i64;
                if (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y) {
                    image.put_pixel(x as u32, y as u32, Rgb([255, 255, 255]));
                }
            }
        }

        image
            .save(path)
            .with_context(|| format!("Failed to write image: {}", path.display()))
    }
}
