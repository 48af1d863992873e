use foundation::math::Vec2;
use scene::World;
use scene::camera::Camera3D;
use scene::orbit::OrbitModel;
use scene::picking::{PickHit, Ray, pick_ray};
use tracing::debug;

/// Size of the draw surface in device pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.width / self.height)
    }

    /// Pixel coordinates (origin top left, y down) to normalized device
    /// coordinates (y up). Points off the surface map outside `[-1, 1]`.
    pub fn to_ndc(&self, x: f64, y: f64) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        Some(Vec2::new(
            x / self.width * 2.0 - 1.0,
            -(y / self.height) * 2.0 + 1.0,
        ))
    }

    /// Nearest point on the surface.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.width.max(0.0)), y.clamp(0.0, self.height.max(0.0)))
    }
}

/// Resolves clicks to orbiting bodies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerPicker {
    viewport: Viewport,
}

impl PointerPicker {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Pick ray through pixel `(x, y)`, built from the camera as it is now.
    pub fn ray(&self, camera: &Camera3D, x: f64, y: f64) -> Option<Ray> {
        let ndc = self.viewport.to_ndc(x, y)?;
        camera.ray_through_ndc(ndc)
    }

    /// Closest orbiting body under `(x, y)` at its current position. Only
    /// bodies of `orbits` are candidates.
    pub fn pick(
        &self,
        world: &World,
        camera: &Camera3D,
        orbits: &OrbitModel,
        x: f64,
        y: f64,
    ) -> Option<PickHit> {
        let ray = self.ray(camera, x, y)?;
        let hit = pick_ray(world, ray, orbits.entities());
        debug!(x, y, hit = ?hit.map(|h| h.index), "pick");
        hit
    }

    /// Body index under `(x, y)`, if any.
    pub fn resolve(
        &self,
        world: &World,
        camera: &Camera3D,
        orbits: &OrbitModel,
        x: f64,
        y: f64,
    ) -> Option<usize> {
        self.pick(world, camera, orbits, x, y).map(|hit| hit.index)
    }
}
