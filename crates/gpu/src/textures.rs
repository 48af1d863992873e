use crate::backend::RenderError;

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(RenderError::InvalidTexture {
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// A single opaque pixel.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: color.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

#[cfg(test)]
mod tests {
    use super::TextureData;
    use crate::backend::RenderError;

    #[test]
    fn rejects_mismatched_pixel_buffer() {
        assert_eq!(
            TextureData::new(2, 2, vec![0; 15]),
            Err(RenderError::InvalidTexture {
                width: 2,
                height: 2,
                len: 15
            })
        );
        assert!(TextureData::new(0, 4, Vec::new()).is_err());
        assert_eq!(TextureData::new(2, 1, vec![9; 8]).map(|t| t.width()), Ok(2));
    }
}
