use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Export settings, mirroring the session properties a host application
/// would hold: output root, file prefix, target group, box size threshold,
/// frame range, and the overwrite policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory receiving `images/` and `labels/`.
    pub output_dir: PathBuf,
    /// Prefix for generated files (e.g. "A", "train"); empty for none.
    /// Ten characters or fewer recommended, not enforced.
    #[serde(default = "default_image_set")]
    pub image_set: String,
    /// Only objects in this group are labeled.
    pub collection: String,
    /// Minimum normalized width or height of a box worth keeping.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_frame_start")]
    pub frame_start: u32,
    #[serde(default = "default_frame_end")]
    pub frame_end: u32,
    /// When false, frames whose image file already exists are skipped.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

/// Top-level CLI configuration: scene source plus export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Path to the glTF scene to label.
    pub scene: PathBuf,
    /// Frames per second of the scene's animation timeline.
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(flatten)]
    pub export: ExportConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<RunConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        // The threshold slider has always been bounded to [0, 0.1].
        config.export.threshold = config.export.threshold.clamp(0.0, 0.1);

        Ok(config)
    }
}

fn default_image_set() -> String {
    "A".to_string()
}

fn default_threshold() -> f32 {
    0.01
}

fn default_frame_start() -> u32 {
    1
}

fn default_frame_end() -> u32 {
    250
}

fn default_overwrite() -> bool {
    true
}

fn default_fps() -> f32 {
    24.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_in_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{"scene": "scene.gltf", "output_dir": "out", "collection": "train"}"#,
        )
        .unwrap();

        assert_eq!(config.export.image_set, "A");
        assert_eq!(config.export.threshold, 0.01);
        assert_eq!(config.export.frame_start, 1);
        assert_eq!(config.export.frame_end, 250);
        assert!(config.export.overwrite);
        assert_eq!(config.fps, 24.0);
    }

    #[test]
    fn threshold_is_clamped_on_load() {
        let dir = std::env::temp_dir().join(format!("autolabel-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{"scene": "s.gltf", "output_dir": "out", "collection": "train", "threshold": 0.5}"#,
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.export.threshold, 0.1);

        fs::remove_dir_all(&dir).ok();
    }
}
