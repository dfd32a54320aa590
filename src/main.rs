use std::path::Path;

use anyhow::{Context, Result};

use autolabel::capture::PointCloudCapture;
use autolabel::config::RunConfig;
use autolabel::labeling::exporter;
use autolabel::scene_graph::scene::Scene;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .context("Usage: autolabel <config.json>")?;
    let config = RunConfig::load(Path::new(&config_path))?;

    let mut scene = Scene::from_gltf(&config.scene)?;
    scene.fps = config.fps;

    let capture = PointCloudCapture::default();
    exporter::export(&mut scene, &config.export, &capture, None)?;

    Ok(())
}
