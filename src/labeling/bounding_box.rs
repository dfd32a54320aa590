use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// A 2D box in normalized image coordinates: origin at the top-left corner,
/// y increasing downward, all values in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
}

/// One line of a YOLO label file: a class plus its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    pub class_id: u32,
    pub bbox: BoundingBox,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            self.bbox.x_center,
            self.bbox.y_center,
            self.bbox.width,
            self.bbox.height
        )
    }
}

impl FromStr for Label {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| anyhow!("Label line missing field: {}", name))
        };

        let class_id = next("class_id")?
            .parse::<u32>()
            .context("Invalid class id")?;
        let x_center = next("x_center")?.parse::<f32>().context("Invalid x")?;
        let y_center = next("y_center")?.parse::<f32>().context("Invalid y")?;
        let width = next("width")?.parse::<f32>().context("Invalid width")?;
        let height = next("height")?.parse::<f32>().context("Invalid height")?;

        Ok(Label {
            class_id,
            bbox: BoundingBox {
                x_center,
                y_center,
                width,
                height,
            },
        })
    }
}
