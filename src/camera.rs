use glam::{Mat4, Vec3};

/// Fallback when a glTF camera leaves the aspect ratio to the viewer.
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// Perspective lens parameters, matching the glTF camera model.
#[derive(Debug, Clone, Copy)]
pub struct Lens {
    /// Vertical field of view in radians.
    pub yfov: f32,
    pub aspect: f32,
    pub znear: f32,
    /// `None` means an infinite far plane.
    pub zfar: Option<f32>,
}

impl Lens {
    pub fn projection_matrix(&self) -> Mat4 {
        match self.zfar {
            Some(zfar) => Mat4::perspective_rh(self.yfov, self.aspect, self.znear, zfar),
            None => Mat4::perspective_infinite_rh(self.yfov, self.aspect, self.znear),
        }
    }
}

/// A camera pose plus lens, resolved for a single frame.
///
/// `world` is the camera node's world matrix; the camera looks down its local
/// -Z axis (glTF convention).
pub struct Camera {
    pub world: Mat4,
    pub lens: Lens,
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, lens: Lens) -> Camera {
        Camera {
            world: Mat4::look_at_rh(eye, target, up).inverse(),
            lens,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world.inverse()
    }

    /// Projects a world-space point into normalized view coordinates.
    ///
    /// Returns `(u, v, depth)`: `u` and `v` are in [0, 1] when the point is
    /// inside the view, with `v = 0` at the *bottom* of the frame, and are
    /// deliberately not clamped — points outside the frustum yield
    /// out-of-range values, and a point on the camera plane yields non-finite
    /// ones. `depth` is the distance along the view axis, negative behind the
    /// camera.
    pub fn world_to_view(&self, point: Vec3) -> Vec3 {
        let view_point = self.view_matrix().transform_point3(point);
        let clip = self.lens.projection_matrix() * view_point.extend(1.0);

        let u = 0.5 * (clip.x / clip.w + 1.0);
        let v = 0.5 * (clip.y / clip.w + 1.0);

        Vec3::new(u, v, -view_point.z)
    }
}
