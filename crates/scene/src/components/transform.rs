use foundation::math::{Mat4, Rotation3, Vec3, mat4_compose};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles (radians) applied in `XYZ` order.
    pub rotation: Vec3,
    pub scale: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        mat4_compose(self.position, self.rotation, self.scale)
    }

    /// Maps a world-space point into this transform's local space.
    pub fn to_local_point(&self, world: Vec3) -> Vec3 {
        let rotated = Rotation3::from_euler_xyz(self.rotation).apply_inverse(world - self.position);
        rotated * (1.0 / self.scale)
    }

    /// Maps a world-space direction into local space. Distances along the
    /// result are scaled by `1 / scale`.
    pub fn to_local_dir(&self, world: Vec3) -> Vec3 {
        Rotation3::from_euler_xyz(self.rotation).apply_inverse(world) * (1.0 / self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::Vec3;

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(transform.scale, 1.0);
    }

    #[test]
    fn local_point_undoes_translation_and_scale() {
        let t = Transform {
            position: Vec3::new(2.0, 0.0, 0.0),
            rotation: Vec3::ZERO,
            scale: 2.0,
        };
        assert_eq!(t.to_local_point(Vec3::new(4.0, 2.0, 0.0)), Vec3::new(1.0, 1.0, 0.0));
    }
}
