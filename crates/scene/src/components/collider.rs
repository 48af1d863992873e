use crate::world::OutlineId;

/// Local-space solid used for ray picking.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Collider {
    Sphere { radius: f64 },
    /// Convex outline (CCW, in the local xy plane) swept over
    /// `z in [-half_depth, half_depth]`.
    Prism { outline: OutlineId, half_depth: f64 },
}

impl Collider {
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    pub fn prism(outline: OutlineId, half_depth: f64) -> Self {
        Self::Prism {
            outline,
            half_depth,
        }
    }
}
