use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use crate::capture::Capture;
use crate::config::ExportConfig;
use crate::labeling::bounding_box::Label;
use crate::labeling::projector::{self, Projection};
use crate::scene_graph::scene::Scene;

/// Counters reported after a run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub frames_processed: usize,
    pub frames_skipped: usize,
    pub labels_written: usize,
    pub cancelled: bool,
}

/// Renders every frame in the configured range and writes one YOLO label
/// file per frame, one line per visible tagged object in the target group.
///
/// Preconditions (no side effects on failure): the target group exists and
/// the scene has an active camera. Per-object skips (not a mesh, not in the
/// group, untagged, rejected by the projector) are silent. I/O failures
/// abort the run; label and image sets must stay consistent for training.
///
/// The cancellation flag is honored between frames only, so every processed
/// frame's files are complete.
pub fn export(
    scene: &mut Scene,
    config: &ExportConfig,
    capture: &dyn Capture,
    cancel: Option<&AtomicBool>,
) -> Result<ExportSummary> {
    if !scene.has_group(&config.collection) {
        warn!("No collection named {:?} in the scene.", config.collection);
        bail!("Unknown target collection: {}", config.collection);
    }
    if scene.active_camera().is_none() {
        warn!("The scene has no active camera.");
        bail!("No active camera in the scene");
    }

    let images_dir = config.output_dir.join("images");
    let labels_dir = config.output_dir.join("labels");
    for dir in [&config.output_dir, &images_dir, &labels_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    // The current-frame pointer is shared session state; put it back on
    // every exit path, normal or aborted.
    let original_frame = scene.current_frame();
    let result = export_frames(scene, config, capture, cancel, &images_dir, &labels_dir);
    scene.set_current_frame(original_frame);

    let summary = result?;
    info!(
        "Finished rendering of {} frames with labels ({} skipped, {} boxes written).",
        summary.frames_processed, summary.frames_skipped, summary.labels_written
    );

    Ok(summary)
}

fn export_frames(
    scene: &mut Scene,
    config: &ExportConfig,
    capture: &dyn Capture,
    cancel: Option<&AtomicBool>,
    images_dir: &Path,
    labels_dir: &Path,
) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for frame in config.frame_start..=config.frame_end {
        if let Some(cancel) = cancel {
            if cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break;
            }
        }

        scene.set_current_frame(frame);

        let stem = if config.image_set.is_empty() {
            format!("{:04}", frame)
        } else {
            format!("{}_{:04}", config.image_set, frame)
        };

        let image_path = images_dir.join(format!("{}.{}", stem, capture.extension()));
        if !config.overwrite && image_path.exists() {
            summary.frames_skipped += 1;
            continue;
        }

        // Resolved per frame: the camera node may itself be animated.
        let camera = scene
            .active_camera()
            .context("Active camera disappeared mid-run")?;

        capture
            .capture(scene, &camera, &image_path)
            .with_context(|| format!("Capture failed for frame {}", frame))?;

        let mut lines = String::new();
        for (id, object) in scene.objects.iter() {
            let Some(model_id) = object.model_id else {
                continue; // not a mesh
            };
            if !scene.group_contains(&config.collection, id) {
                continue;
            }
            let Some(class_id) = object.class_id else {
                continue; // untagged
            };
            let Some(model) = scene.models.get(model_id) else {
                continue;
            };

            let world = *object.transform.get_world_matrix();
            match projector::project(model, world, &camera, config.threshold) {
                Projection::Accepted(bbox) => {
                    lines.push_str(&Label { class_id, bbox }.to_string());
                    lines.push('\n');
                    summary.labels_written += 1;
                }
                Projection::Rejected(_) => {} // expected, not an error
            }
        }

        // One buffered write per frame so an interrupted run never leaves a
        // truncated label file behind.
        let label_path = labels_dir.join(format!("{}.txt", stem));
        fs::write(&label_path, lines)
            .with_context(|| format!("Failed to write label file: {}", label_path.display()))?;

        summary.frames_processed += 1;
        debug!("Exported frame {}", frame);
    }

    Ok(summary)
}
