//! Triangle meshes for the drawable shapes.

use earcutr::earcut;
use foundation::math::{Vec2, Vec3};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.as_f32());
        self.normals.push(normal.as_f32());
        self.uvs.push(uv);
        index
    }
}

/// UV sphere centered on the origin. `u` runs around the equator, `v` from the
/// south pole (0) to the north pole (1).
pub fn uv_sphere(radius: f64, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::default();

    for iy in 0..=height_segments {
        let v = iy as f64 / height_segments as f64;
        let theta = v * std::f64::consts::PI;
        for ix in 0..=width_segments {
            let u = ix as f64 / width_segments as f64;
            let phi = u * std::f64::consts::TAU;

            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.push_vertex(normal * radius, normal, [u as f32, 1.0 - v as f32]);
        }
    }

    let stride = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;

            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

/// Extrudes a CCW polygon along z into a closed solid spanning
/// `[-half_depth, half_depth]`. Cap UVs map the polygon's bounding box onto
/// `[0, 1]^2`.
pub fn extrude_outline(outline: &[Vec2], half_depth: f64) -> MeshData {
    let mut mesh = MeshData::default();
    if outline.len() < 3 {
        return mesh;
    }

    let coords: Vec<f64> = outline.iter().flat_map(|p| [p.x, p.y]).collect();
    let Ok(cap) = earcut(&coords, &[], 2) else {
        return mesh;
    };

    let (min, max) = outline.iter().fold(
        (Vec2::new(f64::MAX, f64::MAX), Vec2::new(f64::MIN, f64::MIN)),
        |(lo, hi), p| {
            (
                Vec2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Vec2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        },
    );
    let span = Vec2::new((max.x - min.x).max(1e-12), (max.y - min.y).max(1e-12));
    let uv = |p: Vec2| {
        [
            ((p.x - min.x) / span.x) as f32,
            ((p.y - min.y) / span.y) as f32,
        ]
    };

    // Front cap (+z) keeps the outline winding; back cap (-z) reverses it.
    let front_normal = Vec3::new(0.0, 0.0, 1.0);
    let front_base = mesh.positions.len() as u32;
    for p in outline {
        mesh.push_vertex(Vec3::new(p.x, p.y, half_depth), front_normal, uv(*p));
    }
    let back_base = mesh.positions.len() as u32;
    for p in outline {
        mesh.push_vertex(Vec3::new(p.x, p.y, -half_depth), -front_normal, uv(*p));
    }
    for tri in cap.chunks_exact(3) {
        let (a, b, c) = (tri[0] as u32, tri[1] as u32, tri[2] as u32);
        if orientation(outline, tri) >= 0.0 {
            mesh.indices.extend_from_slice(&[front_base + a, front_base + b, front_base + c]);
            mesh.indices.extend_from_slice(&[back_base + a, back_base + c, back_base + b]);
        } else {
            mesh.indices.extend_from_slice(&[front_base + a, front_base + c, front_base + b]);
            mesh.indices.extend_from_slice(&[back_base + a, back_base + b, back_base + c]);
        }
    }

    // Side walls, one flat-shaded quad per edge.
    let perimeter: f64 = (0..outline.len())
        .map(|i| (outline[(i + 1) % outline.len()] - outline[i]).length())
        .sum::<f64>()
        .max(1e-12);
    let mut travelled = 0.0;
    for i in 0..outline.len() {
        let p0 = outline[i];
        let p1 = outline[(i + 1) % outline.len()];
        let edge = p1 - p0;
        let Some(normal) = Vec3::new(edge.y, -edge.x, 0.0).normalize() else {
            continue;
        };
        let u0 = (travelled / perimeter) as f32;
        travelled += edge.length();
        let u1 = (travelled / perimeter) as f32;

        let a = mesh.push_vertex(Vec3::new(p0.x, p0.y, -half_depth), normal, [u0, 0.0]);
        let b = mesh.push_vertex(Vec3::new(p1.x, p1.y, -half_depth), normal, [u1, 0.0]);
        let c = mesh.push_vertex(Vec3::new(p1.x, p1.y, half_depth), normal, [u1, 1.0]);
        let d = mesh.push_vertex(Vec3::new(p0.x, p0.y, half_depth), normal, [u0, 1.0]);
        mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    mesh
}

fn orientation(outline: &[Vec2], tri: &[usize]) -> f64 {
    let (a, b, c) = (outline[tri[0]], outline[tri[1]], outline[tri[2]]);
    (b - a).perp_dot(c - a)
}

#[cfg(test)]
mod tests {
    use super::{extrude_outline, uv_sphere};
    use foundation::math::Vec2;

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = uv_sphere(2.0, 16, 12);
        assert_eq!(mesh.vertex_count(), 17 * 13);
        for p in &mesh.positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 2.0).abs() < 1e-5);
        }
        // Pole rows contribute one triangle per segment, the rest two.
        assert_eq!(mesh.triangle_count(), 16 * 2 * 12 - 2 * 16);
        assert!(mesh.indices.iter().all(|i| (*i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn extruded_square_has_caps_and_walls() {
        let square = vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ];
        let mesh = extrude_outline(&square, 0.01);
        // 2 caps x 2 triangles + 4 walls x 2 triangles.
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertex_count(), 4 + 4 + 4 * 4);
        for uv in &mesh.uvs[..4] {
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn degenerate_outline_yields_empty_mesh() {
        let mesh = extrude_outline(&[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)], 0.1);
        assert_eq!(mesh.triangle_count(), 0);
    }
}
