use std::collections::HashSet;

use foundation::math::precision::StableF64;
use foundation::math::{Mat4, mat4_identity};
use scene::World;
use scene::camera::Camera3D;
use scene::components::{Material, Shape3D};
use scene::entity::EntityId;
use scene::mesh::{MeshData, extrude_outline, uv_sphere};
use scene::world::OutlineId;
use tracing::debug;

use crate::backend::{RenderBackend, RenderError};

/// Identity of a mesh's geometry. Entities with equal keys share GPU buffers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MeshKey {
    Sphere {
        radius: StableF64,
        width_segments: u32,
        height_segments: u32,
    },
    Extruded {
        outline: OutlineId,
        half_depth: StableF64,
    },
}

impl MeshKey {
    pub fn for_shape(shape: Shape3D) -> Option<Self> {
        match shape {
            Shape3D::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Some(MeshKey::Sphere {
                radius: StableF64(radius),
                width_segments,
                height_segments,
            }),
            Shape3D::Extruded {
                outline,
                half_depth,
            } => Some(MeshKey::Extruded {
                outline,
                half_depth: StableF64(half_depth),
            }),
            Shape3D::Point => None,
        }
    }

    /// Triangulates the geometry. `None` if the outline is unknown.
    pub fn build(&self, world: &World) -> Option<MeshData> {
        match *self {
            MeshKey::Sphere {
                radius,
                width_segments,
                height_segments,
            } => Some(uv_sphere(radius.0, width_segments, height_segments)),
            MeshKey::Extruded {
                outline,
                half_depth,
            } => Some(extrude_outline(world.outline(outline)?, half_depth.0)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawMesh {
    pub entity: EntityId,
    pub mesh: MeshKey,
    pub model: Mat4,
    /// `material.texture` is cleared while the texture is not ready.
    pub material: Material,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub clear_color: [f32; 4],
    pub view_proj: Mat4,
    /// Opaque meshes in spawn order, then translucent ones.
    pub meshes: Vec<DrawMesh>,
    pub points: Vec<[f32; 3]>,
    pub point_color: [f32; 4],
}

impl Default for RenderFrame {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            view_proj: mat4_identity(),
            meshes: Vec::new(),
            points: Vec::new(),
            point_color: Material::WHITE,
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn collect_3d(world: &World, camera: &Camera3D) -> RenderFrame {
        let mut frame = RenderFrame {
            view_proj: camera.view_proj(),
            ..RenderFrame::default()
        };
        let mut translucent = Vec::new();

        for (entity, transform, drawable, mut material) in world.drawables_3d() {
            let Some(mesh) = MeshKey::for_shape(drawable.shape) else {
                frame.points.push(transform.position.as_f32());
                continue;
            };
            material.texture = material.texture.filter(|t| world.texture_ready(*t));

            let draw = DrawMesh {
                entity,
                mesh,
                model: transform.model_matrix(),
                material,
            };
            if material.is_translucent() {
                translucent.push(draw);
            } else {
                frame.meshes.push(draw);
            }
        }

        frame.meshes.extend(translucent);
        frame
    }
}

/// Tracks which meshes a backend already holds and uploads the rest.
#[derive(Debug, Default)]
pub struct MeshCache {
    uploaded: HashSet<MeshKey>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &MeshKey) -> bool {
        self.uploaded.contains(key)
    }

    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }

    pub fn sync(
        &mut self,
        world: &World,
        frame: &RenderFrame,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        for draw in &frame.meshes {
            if self.uploaded.contains(&draw.mesh) {
                continue;
            }
            let data = draw.mesh.build(world).ok_or(RenderError::MissingMesh(draw.mesh))?;
            backend.upload_mesh(draw.mesh, &data)?;
            debug!(
                key = ?draw.mesh,
                triangles = data.triangle_count(),
                "mesh uploaded"
            );
            self.uploaded.insert(draw.mesh);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.uploaded.clear();
    }
}
