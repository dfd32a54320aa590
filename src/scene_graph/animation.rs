use glam::{Quat, Vec3};
use itertools::Itertools;

use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// One animated property of one object.
///
/// Invariant, enforced at load time: `times` is non-empty, strictly
/// increasing, and the same length as the keyframe list.
pub struct Channel {
    pub target: ObjectId,
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl Channel {
    /// Samples the channel at `time` (seconds) and writes the result into
    /// `transform`. Times before the first or after the last keyframe clamp
    /// to the end values.
    pub fn apply(&self, time: f32, transform: &mut Transform) {
        let (from, to, factor) = self.segment(time);

        match &self.keyframes {
            Keyframes::Translation(keys) => {
                transform.set_translation(keys[from].lerp(keys[to], factor));
            }
            Keyframes::Rotation(keys) => {
                transform.set_rotation(keys[from].slerp(keys[to], factor));
            }
            Keyframes::Scale(keys) => {
                transform.set_scale(keys[from].lerp(keys[to], factor));
            }
        }
    }

    fn segment(&self, time: f32) -> (usize, usize, f32) {
        let times = &self.times;
        let last = times.len() - 1;

        if time <= times[0] {
            return (0, 0, 0.0);
        }
        if time >= times[last] {
            return (last, last, 0.0);
        }

        let index = times
            .iter()
            .tuple_windows()
            .position(|(start, end)| *start <= time && time < *end)
            .unwrap_or(last - 1);

        let factor = match self.interpolation {
            Interpolation::Step => 0.0,
            Interpolation::Linear => {
                (time - times[index]) / (times[index + 1] - times[index])
            }
        };

        (index, index + 1, factor)
    }
}
