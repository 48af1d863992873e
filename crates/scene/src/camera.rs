use foundation::math::{Mat4, Vec2, Vec3, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0};

use crate::picking::Ray;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    /// Viewport width / height.
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y_rad,
            aspect: 1.0,
            near,
            far,
        }
    }

    /// Ignores non-positive or non-finite ratios.
    pub fn set_aspect(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = mat4_look_at_rh(self.position, self.target, self.up);
        let proj = mat4_perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far);
        mat4_mul(proj, view)
    }

    /// World-space ray from the eye through a point in normalized device
    /// coordinates (`x` right, `y` up, both in `[-1, 1]` on screen).
    pub fn ray_through_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let forward = (self.target - self.position).normalize()?;
        let right = forward.cross(self.up).normalize()?;
        let up = right.cross(forward);

        let tan_half = (self.fov_y_rad * 0.5).tan();
        let dir = forward + right * (ndc.x * tan_half * self.aspect) + up * (ndc.y * tan_half);
        Some(Ray::new(self.position, dir.normalize()?))
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::look_at(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::ZERO,
            110f64.to_radians(),
            1.0,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Camera3D;
    use foundation::math::{Vec2, Vec3, mat4_transform_point};

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera3D::default();
        let ray = camera.ray_through_ndc(Vec2::new(0.0, 0.0)).expect("ray");
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 2.0));
        assert!((ray.dir.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn edge_ray_matches_field_of_view() {
        let mut camera = Camera3D::default();
        camera.set_aspect(2.0);
        let ray = camera.ray_through_ndc(Vec2::new(0.0, 1.0)).expect("ray");
        let angle = ray.dir.y.atan2(-ray.dir.z);
        assert!((angle - camera.fov_y_rad * 0.5).abs() < 1e-9);

        let ray = camera.ray_through_ndc(Vec2::new(1.0, 0.0)).expect("ray");
        let expected = (camera.fov_y_rad * 0.5).tan() * 2.0;
        assert!((ray.dir.x / -ray.dir.z - expected).abs() < 1e-9);
    }

    #[test]
    fn view_proj_maps_target_to_screen_center() {
        let camera = Camera3D::default();
        let p = mat4_transform_point(camera.view_proj(), Vec3::ZERO);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn rejects_degenerate_aspect() {
        let mut camera = Camera3D::default();
        camera.set_aspect(0.0);
        camera.set_aspect(f64::NAN);
        assert_eq!(camera.aspect, 1.0);
    }
}
