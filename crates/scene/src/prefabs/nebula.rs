use crate::World;
use crate::components::{Drawable3D, Material, Side, Transform};
use crate::entity::EntityId;
use crate::world::TextureId;

/// Inside-out translucent sphere enclosing the whole scene.
pub fn spawn_nebula(
    world: &mut World,
    radius: f64,
    opacity: f32,
    texture: Option<TextureId>,
) -> EntityId {
    let entity = world.spawn();
    world.set_transform(entity, Transform::identity());
    world.set_drawable_3d(entity, Drawable3D::sphere(radius, 32, 32));
    let material = texture.map(Material::textured).unwrap_or_default();
    world.set_material(
        entity,
        material.with_opacity(opacity).with_side(Side::Back),
    );
    entity
}
