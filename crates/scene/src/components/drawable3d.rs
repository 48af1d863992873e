use crate::world::OutlineId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    Sphere {
        radius: f64,
        width_segments: u32,
        height_segments: u32,
    },
    /// Convex outline extruded symmetrically along local z.
    Extruded { outline: OutlineId, half_depth: f64 },
    /// Screen-sized point (background stars).
    Point,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
}

impl Drawable3D {
    pub fn sphere(radius: f64, width_segments: u32, height_segments: u32) -> Self {
        Self {
            shape: Shape3D::Sphere {
                radius,
                width_segments,
                height_segments,
            },
        }
    }

    pub fn extruded(outline: OutlineId, half_depth: f64) -> Self {
        Self {
            shape: Shape3D::Extruded {
                outline,
                half_depth,
            },
        }
    }

    pub fn point() -> Self {
        Self {
            shape: Shape3D::Point,
        }
    }
}
