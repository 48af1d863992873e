use foundation::math::Vec3;

use crate::World;
use crate::components::{Drawable3D, Material, Transform};
use crate::entity::EntityId;
use crate::world::TextureId;

/// Self-rotation in radians per tick about the local X and Y axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spin {
    pub x: f64,
    pub y: f64,
}

impl Spin {
    pub const GLOBE: Spin = Spin { x: 0.0001, y: 0.01 };

    pub fn about_y(y: f64) -> Self {
        Self { x: 0.0, y }
    }

    /// Adds one tick of rotation to `entity`. No-op without a transform.
    pub fn apply(&self, world: &mut World, entity: EntityId) {
        if let Some(transform) = world.transform_mut(entity) {
            transform.rotation += Vec3::new(self.x, self.y, 0.0);
        }
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::GLOBE
    }
}

pub fn spawn_globe(world: &mut World, radius: f64, texture: Option<TextureId>) -> EntityId {
    let entity = world.spawn();
    world.set_transform(entity, Transform::identity());
    world.set_drawable_3d(entity, Drawable3D::sphere(radius, 32, 32));
    world.set_material(
        entity,
        texture.map(Material::textured).unwrap_or_default(),
    );
    entity
}
