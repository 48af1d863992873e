//! Column-major 4x4 matrices in the layout WGSL expects (`m[col][row]`).

use super::{Rotation3, Vec3};

pub type Mat4 = [[f32; 4]; 4];

pub fn mat4_identity() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    // Column-major matrix multiply: c = a * b
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

/// Right-handed perspective projection with depth range [0, 1].
pub fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    // [ m00,  0,   0,   0 ]
    // [  0,  m11,  0,   0 ]
    // [  0,   0,  m22, m23 ]
    // [  0,   0,  -1,   0 ]
    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

pub fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize().unwrap_or(Vec3::new(0.0, 0.0, -1.0));
    let s = f.cross(up).normalize().unwrap_or(Vec3::new(1.0, 0.0, 0.0));
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

/// Model matrix `T * R * S` for a translation, an `XYZ` Euler rotation and a
/// uniform scale.
pub fn mat4_compose(position: Vec3, rotation: Vec3, scale: f64) -> Mat4 {
    let r = Rotation3::from_euler_xyz(rotation).rows;
    let s = scale;
    [
        [
            (r[0][0] * s) as f32,
            (r[1][0] * s) as f32,
            (r[2][0] * s) as f32,
            0.0,
        ],
        [
            (r[0][1] * s) as f32,
            (r[1][1] * s) as f32,
            (r[2][1] * s) as f32,
            0.0,
        ],
        [
            (r[0][2] * s) as f32,
            (r[1][2] * s) as f32,
            (r[2][2] * s) as f32,
            0.0,
        ],
        [position.x as f32, position.y as f32, position.z as f32, 1.0],
    ]
}

/// Transforms a point (w = 1) and performs the perspective divide.
pub fn mat4_transform_point(m: Mat4, p: Vec3) -> Vec3 {
    let (x, y, z) = (p.x as f32, p.y as f32, p.z as f32);
    let mut out = [0.0f32; 4];
    for (row, value) in out.iter_mut().enumerate() {
        *value = m[0][row] * x + m[1][row] * y + m[2][row] * z + m[3][row];
    }
    let w = if out[3].abs() > f32::EPSILON { out[3] } else { 1.0 };
    Vec3::new(
        (out[0] / w) as f64,
        (out[1] / w) as f64,
        (out[2] / w) as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::{
        mat4_compose, mat4_identity, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0,
        mat4_transform_point,
    };
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn identity_is_neutral() {
        let m = mat4_compose(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.2, 0.4, 0.0), 2.0);
        assert_eq!(mat4_mul(mat4_identity(), m), m);
        assert_eq!(mat4_mul(m, mat4_identity()), m);
    }

    #[test]
    fn compose_translates_origin() {
        let m = mat4_compose(Vec3::new(2.25, -1.0, 0.0), Vec3::ZERO, 1.0);
        let p = mat4_transform_point(m, Vec3::ZERO);
        assert_close(p.x, 2.25, 1e-6);
        assert_close(p.y, -1.0, 1e-6);
    }

    #[test]
    fn look_at_target_projects_to_screen_center() {
        let view = mat4_look_at_rh(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y);
        let proj = mat4_perspective_rh_z0(110f64.to_radians(), 16.0 / 9.0, 1.0, 1000.0);
        let ndc = mat4_transform_point(mat4_mul(proj, view), Vec3::ZERO);
        assert_close(ndc.x, 0.0, 1e-6);
        assert_close(ndc.y, 0.0, 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
