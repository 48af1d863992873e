use std::cell::RefCell;
use std::collections::HashMap;

use gpu::{RenderError, TextureData};

#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    NotFound { path: String },
    Fetch { path: String, reason: String },
    Decode { path: String, reason: String },
    Texture(RenderError),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::NotFound { path } => write!(f, "asset not found: {path}"),
            AssetError::Fetch { path, reason } => write!(f, "failed to fetch {path}: {reason}"),
            AssetError::Decode { path, reason } => write!(f, "failed to decode {path}: {reason}"),
            AssetError::Texture(err) => write!(f, "texture rejected: {err}"),
        }
    }
}

impl std::error::Error for AssetError {}

/// Decodes a PNG or JPEG file into RGBA8 pixels.
pub fn decode_texture(path: &str, bytes: &[u8]) -> Result<TextureData, AssetError> {
    let image = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    TextureData::new(width, height, rgba.into_raw()).map_err(AssetError::Texture)
}

pub type AssetCallback = Box<dyn FnOnce(Result<TextureData, AssetError>)>;

/// Loads a texture by path. `done` runs exactly once, either before `load`
/// returns or at any later point on the same thread.
pub trait AssetLoader {
    fn load(&self, path: &str, done: AssetCallback);
}

/// In-memory loader. In deferred mode completions wait for [`Self::flush`],
/// mimicking a network round trip.
#[derive(Default)]
pub struct MemoryAssetLoader {
    textures: HashMap<String, TextureData>,
    deferred: bool,
    queue: RefCell<Vec<(String, AssetCallback)>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, path: impl Into<String>, texture: TextureData) -> Self {
        self.textures.insert(path.into(), texture);
        self
    }

    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Completes every queued load and returns how many completed.
    pub fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let count = batch.len();
        for (path, done) in batch {
            done(self.lookup(&path));
        }
        count
    }

    fn lookup(&self, path: &str) -> Result<TextureData, AssetError> {
        self.textures
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: path.to_string(),
            })
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load(&self, path: &str, done: AssetCallback) {
        if self.deferred {
            self.queue.borrow_mut().push((path.to_string(), done));
        } else {
            done(self.lookup(path));
        }
    }
}

impl std::fmt::Debug for MemoryAssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAssetLoader")
            .field("textures", &self.textures.len())
            .field("deferred", &self.deferred)
            .field("queued", &self.queued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetError, AssetLoader, MemoryAssetLoader, decode_texture};
    use gpu::TextureData;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn deferred_loads_wait_for_flush() {
        let loader = MemoryAssetLoader::deferred().with_texture("/a.png", TextureData::solid([1, 2, 3, 255]));
        let results = Rc::new(RefCell::new(Vec::new()));
        for path in ["/a.png", "/missing.png"] {
            let results = results.clone();
            loader.load(path, Box::new(move |r| results.borrow_mut().push(r)));
        }
        assert!(results.borrow().is_empty());
        assert_eq!(loader.flush(), 2);

        let results = results.borrow();
        assert_eq!(results[0], Ok(TextureData::solid([1, 2, 3, 255])));
        assert_eq!(
            results[1],
            Err(AssetError::NotFound {
                path: "/missing.png".to_string()
            })
        );
    }

    #[test]
    fn decodes_png_into_rgba() {
        let mut png = Vec::new();
        let pixels = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128])
            .expect("buffer matches size");
        pixels
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode");

        let texture = decode_texture("/icon.png", &png).expect("decode");
        assert_eq!((texture.width(), texture.height()), (2, 1));
        assert_eq!(texture.rgba(), &[255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_texture("/broken.jpg", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { ref path, .. } if path == "/broken.jpg"));
    }
}
