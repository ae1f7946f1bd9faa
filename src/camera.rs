//! Fixed perspective camera and screen-to-world picking rays.

use glam::{Mat4, Vec2, Vec3};

use crate::config::SceneConfig;
use crate::math::Ray;

/// Camera on the +Z side of `target`, `distance` away, looking down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height of the render target.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera on the +Z axis looking at the origin.
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            distance: config.camera_distance,
            target: Vec3::ZERO,
            fov_y: config.fov_degrees.to_radians(),
            aspect: 1.0,
            near: config.near,
            far: config.far,
        }
    }

    /// The camera's world position.
    pub fn position(&self) -> Vec3 {
        self.target + Vec3::Z * self.distance
    }

    /// Update the aspect ratio from pixel dimensions.
    ///
    /// Zero-sized viewports (minimized windows) leave the camera untouched.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Projection with a 0..1 depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position() {
        let camera = Camera::new(&SceneConfig::default());
        assert!((camera.position() - Vec3::new(0.0, 0.0, 30.0)).length() < 1e-5);
    }

    #[test]
    fn test_viewport_is_idempotent_and_ignores_zero() {
        let mut camera = Camera::new(&SceneConfig::default());
        camera.set_viewport(1280, 720);
        let once = camera.view_proj();
        camera.set_viewport(1280, 720);
        assert_eq!(camera.view_proj(), once);

        camera.set_viewport(0, 720);
        assert_eq!(camera.view_proj(), once);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let mut camera = Camera::new(&SceneConfig::default());
        camera.set_viewport(800, 600);
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!(ray.intersect_sphere(Vec3::ZERO, 0.2).is_some());
    }

    #[test]
    fn test_off_center_ray_diverges() {
        let mut camera = Camera::new(&SceneConfig::default());
        camera.set_viewport(800, 800);
        let ray = camera.ray_from_ndc(Vec2::new(1.0, 0.0));
        // Right edge of a 75 degree square frustum
        let expected_angle = (75.0_f32.to_radians() / 2.0).tan();
        assert!((ray.direction.x / -ray.direction.z - expected_angle).abs() < 1e-3);
    }
}
