use crate::World;
use crate::components::{Collider, Drawable3D, Material, Transform};
use crate::entity::EntityId;
use crate::geometry::{Extrusion, GeometryError, RoundedRect};
use crate::world::{OutlineId, TextureId};

/// Outline and thickness shared by every icon of a scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IconTemplate {
    pub outline: OutlineId,
    pub half_depth: f64,
}

impl IconTemplate {
    /// Flattens the bevelled, centered cross-section of `rect` and registers
    /// it with the world.
    pub fn register(
        world: &mut World,
        rect: &RoundedRect,
        extrusion: Extrusion,
        divisions: u32,
    ) -> Result<Self, GeometryError> {
        let points = extrusion.cross_section(rect, divisions)?;
        Ok(Self {
            outline: world.add_outline(points),
            half_depth: extrusion.half_depth(),
        })
    }
}

/// Extruded rounded square with a matching prism collider.
pub fn spawn_icon(world: &mut World, template: IconTemplate, texture: Option<TextureId>) -> EntityId {
    let entity = world.spawn();
    world.set_transform(entity, Transform::identity());
    world.set_drawable_3d(
        entity,
        Drawable3D::extruded(template.outline, template.half_depth),
    );
    world.set_collider(
        entity,
        Collider::prism(template.outline, template.half_depth),
    );
    world.set_material(
        entity,
        texture.map(Material::textured).unwrap_or_default(),
    );
    entity
}

/// Solid sphere standing in for an icon.
pub fn spawn_placeholder(world: &mut World, radius: f64, color: [f32; 4]) -> EntityId {
    let entity = world.spawn();
    world.set_transform(entity, Transform::identity());
    world.set_drawable_3d(entity, Drawable3D::sphere(radius, 16, 16));
    world.set_collider(entity, Collider::sphere(radius));
    world.set_material(entity, Material::solid(color));
    entity
}
