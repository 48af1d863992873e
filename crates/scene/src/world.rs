use foundation::handles::Handle;
use foundation::math::Vec2;

use crate::components::{Collider, Drawable3D, Material, Transform};
use crate::entity::EntityId;

/// Shared outline polygon registered with [`World::add_outline`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OutlineId(pub u32);

/// Texture slot registered with [`World::add_texture`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub path: String,
    pub state: TextureState,
}

#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    transforms: Vec<Option<Transform>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    materials: Vec<Option<Material>>,
    colliders: Vec<Option<Collider>>,
    outlines: Vec<Vec<Vec2>>,
    textures: Vec<TextureEntry>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(Handle::new(self.next_index, 0));
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        id
    }

    pub fn entity_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms
            .get(entity.index() as usize)
            .and_then(|t| *t)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms
            .get_mut(entity.index() as usize)
            .and_then(|t| t.as_mut())
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) {
        self.ensure_capacity(entity.index() as usize);
        self.drawables_3d[entity.index() as usize] = Some(drawable);
    }

    pub fn drawable_3d(&self, entity: EntityId) -> Option<Drawable3D> {
        self.drawables_3d
            .get(entity.index() as usize)
            .and_then(|d| *d)
    }

    pub fn set_material(&mut self, entity: EntityId, material: Material) {
        self.ensure_capacity(entity.index() as usize);
        self.materials[entity.index() as usize] = Some(material);
    }

    pub fn material(&self, entity: EntityId) -> Option<Material> {
        self.materials.get(entity.index() as usize).and_then(|m| *m)
    }

    pub fn set_collider(&mut self, entity: EntityId, collider: Collider) {
        self.ensure_capacity(entity.index() as usize);
        self.colliders[entity.index() as usize] = Some(collider);
    }

    pub fn collider(&self, entity: EntityId) -> Option<Collider> {
        self.colliders.get(entity.index() as usize).and_then(|c| *c)
    }

    pub fn add_outline(&mut self, points: Vec<Vec2>) -> OutlineId {
        let id = OutlineId(self.outlines.len() as u32);
        self.outlines.push(points);
        id
    }

    pub fn outline(&self, id: OutlineId) -> Option<&[Vec2]> {
        self.outlines.get(id.0 as usize).map(Vec::as_slice)
    }

    pub fn add_texture(&mut self, path: impl Into<String>) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(TextureEntry {
            path: path.into(),
            state: TextureState::Pending,
        });
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureEntry> {
        self.textures.get(id.0 as usize)
    }

    /// Returns `false` for an unknown id.
    pub fn set_texture_state(&mut self, id: TextureId, state: TextureState) -> bool {
        match self.textures.get_mut(id.0 as usize) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &TextureEntry)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(idx, entry)| (TextureId(idx as u32), entry))
    }

    pub fn texture_ready(&self, id: TextureId) -> bool {
        matches!(
            self.texture(id).map(|t| &t.state),
            Some(TextureState::Ready)
        )
    }

    /// Every entity with a transform and a 3D drawable, in spawn order.
    /// Entities without a material get the default one.
    pub fn drawables_3d(&self) -> Vec<(EntityId, Transform, Drawable3D, Material)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables_3d.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let Some(transform) = self.transforms.get(idx).and_then(|t| *t) else {
                continue;
            };
            let material = self
                .materials
                .get(idx)
                .and_then(|m| *m)
                .unwrap_or_default();

            out.push((
                EntityId(Handle::new(idx as u32, 0)),
                transform,
                *drawable,
                material,
            ));
        }
        out
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.drawables_3d.resize(new_len, None);
            self.materials.resize(new_len, None);
            self.colliders.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TextureId, TextureState, World};
    use crate::components::{Drawable3D, Material, Transform};
    use foundation::math::Vec3;

    #[test]
    fn spawn_and_collect_drawables() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_transform(entity, Transform::identity());
        world.set_drawable_3d(entity, Drawable3D::sphere(1.0, 8, 8));

        let drawables = world.drawables_3d();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, entity);
        assert_eq!(drawables[0].3, Material::default());
    }

    #[test]
    fn drawables_without_transform_are_skipped() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_drawable_3d(entity, Drawable3D::point());
        assert!(world.drawables_3d().is_empty());
    }

    #[test]
    fn transform_mut_updates_in_place() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_transform(entity, Transform::identity());
        if let Some(t) = world.transform_mut(entity) {
            t.position = Vec3::new(1.0, 2.0, 3.0);
        }
        assert_eq!(
            world.transform(entity).map(|t| t.position),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn texture_slots_track_state() {
        let mut world = World::new();
        let tex = world.add_texture("/earthmap1k.jpg");
        assert!(!world.texture_ready(tex));
        assert!(world.set_texture_state(tex, TextureState::Ready));
        assert!(world.texture_ready(tex));
        assert!(!world.set_texture_state(TextureId(7), TextureState::Ready));
    }
}
