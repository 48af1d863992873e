use super::Vec3;

/// Row-major 3x3 rotation built from Euler angles applied in `XYZ` order
/// (`R = Rx * Ry * Rz`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation3 {
    pub rows: [[f64; 3]; 3],
}

impl Rotation3 {
    pub fn identity() -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn from_euler_xyz(euler: Vec3) -> Self {
        let (a, b) = (euler.x.cos(), euler.x.sin());
        let (c, d) = (euler.y.cos(), euler.y.sin());
        let (e, f) = (euler.z.cos(), euler.z.sin());

        let ae = a * e;
        let af = a * f;
        let be = b * e;
        let bf = b * f;

        Self {
            rows: [
                [c * e, -c * f, d],
                [af + be * d, ae - bf * d, -b * c],
                [bf - ae * d, be + af * d, a * c],
            ],
        }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Applies the inverse rotation (the transpose).
    pub fn apply_inverse(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[1][0] * v.y + r[2][0] * v.z,
            r[0][1] * v.x + r[1][1] * v.y + r[2][1] * v.z,
            r[0][2] * v.x + r[1][2] * v.y + r[2][2] * v.z,
        )
    }
}
