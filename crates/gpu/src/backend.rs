use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use scene::mesh::MeshData;
use scene::world::TextureId;

use crate::renderer::{MeshKey, RenderFrame};
use crate::textures::TextureData;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The backend was disposed; nothing more can be drawn.
    Disposed,
    InvalidTexture { width: u32, height: u32, len: usize },
    MissingMesh(MeshKey),
    Surface(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Disposed => write!(f, "render backend already disposed"),
            RenderError::InvalidTexture { width, height, len } => write!(
                f,
                "texture {width}x{height} needs {} bytes of RGBA, got {len}",
                *width as usize * *height as usize * 4
            ),
            RenderError::MissingMesh(key) => write!(f, "mesh {key:?} was never uploaded"),
            RenderError::Surface(msg) => write!(f, "surface error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Draw surface driven once per tick. Calls never overlap.
pub trait RenderBackend {
    fn resize(&mut self, width: u32, height: u32);

    fn upload_mesh(&mut self, key: MeshKey, mesh: &MeshData) -> Result<(), RenderError>;

    fn upload_texture(&mut self, id: TextureId, texture: &TextureData) -> Result<(), RenderError>;

    /// Clear, draw every mesh and point of `frame`, present.
    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError>;

    /// Releases GPU resources. Idempotent; later calls fail with
    /// [`RenderError::Disposed`].
    fn dispose(&mut self);
}

/// Shared backend, for hosts that keep observing it after handing it over.
impl<B: RenderBackend> RenderBackend for Rc<RefCell<B>> {
    fn resize(&mut self, width: u32, height: u32) {
        self.borrow_mut().resize(width, height);
    }

    fn upload_mesh(&mut self, key: MeshKey, mesh: &MeshData) -> Result<(), RenderError> {
        self.borrow_mut().upload_mesh(key, mesh)
    }

    fn upload_texture(&mut self, id: TextureId, texture: &TextureData) -> Result<(), RenderError> {
        self.borrow_mut().upload_texture(id, texture)
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        self.borrow_mut().render(frame)
    }

    fn dispose(&mut self) {
        self.borrow_mut().dispose();
    }
}

/// Headless backend that remembers what it was asked to draw.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    size: (u32, u32),
    meshes: HashMap<MeshKey, usize>,
    mesh_uploads: usize,
    textures: HashMap<TextureId, (u32, u32)>,
    frames: u64,
    last_frame: Option<RenderFrame>,
    disposed: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }

    pub fn mesh_uploads(&self) -> usize {
        self.mesh_uploads
    }

    pub fn has_texture(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn upload_mesh(&mut self, key: MeshKey, mesh: &MeshData) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.meshes.insert(key, mesh.triangle_count());
        self.mesh_uploads += 1;
        Ok(())
    }

    fn upload_texture(&mut self, id: TextureId, texture: &TextureData) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.textures.insert(id, (texture.width(), texture.height()));
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        if let Some(missing) = frame.meshes.iter().find(|d| !self.meshes.contains_key(&d.mesh)) {
            return Err(RenderError::MissingMesh(missing.mesh));
        }
        self.frames += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.meshes.clear();
        self.textures.clear();
        self.last_frame = None;
    }
}
