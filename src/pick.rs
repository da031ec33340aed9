use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::config::CameraConfig;

/// Half-line in world space. `dir` is unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Intersection with the infinite horizontal plane `y = height`.
    /// `None` when the ray is parallel to it or points away.
    pub fn intersect_plane_y(&self, height: f32) -> Option<Vec3> {
        if self.dir.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - self.origin.y) / self.dir.y;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }

    /// Distance along the ray to the first hit on a sphere, if any.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.dir);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        if near >= 0.0 {
            return Some(near);
        }
        // Origin inside the sphere.
        let far = -b + sqrt_disc;
        (far >= 0.0).then_some(far)
    }
}

/// Perspective camera used to turn pointer coordinates into picking rays.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    view_proj: Mat4,
    inv_view_proj: Mat4,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far);
        let view_proj = proj * view;
        Self {
            eye,
            view_proj,
            inv_view_proj: view_proj.inverse(),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            config.eye(),
            config.target(),
            config.fov_y_degrees,
            config.aspect,
            config.near,
            config.far,
        )
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Ray through a pointer in normalized device coordinates
    /// (x right, y up, both in [-1, 1]).
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let far = self.inv_view_proj * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let far = far.truncate() / far.w;
        Ray::new(self.eye, far - self.eye)
    }

    /// Normalized device coordinates of a world point, `None` behind the eye.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        (clip.w > 0.0).then(|| Vec2::new(clip.x, clip.y) / clip.w)
    }
}

/// Convert a pointer position in pixels to normalized device coordinates.
pub fn pointer_to_ndc(pointer: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (pointer.x / viewport.x) * 2.0 - 1.0,
        -(pointer.y / viewport.y) * 2.0 + 1.0,
    )
}

/// Inverse of [`pointer_to_ndc`].
pub fn ndc_to_pointer(ndc: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    )
}
