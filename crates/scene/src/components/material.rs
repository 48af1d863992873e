use crate::world::TextureId;

/// Which faces of a mesh are drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    /// Inside-out: only faces pointing away from the viewer.
    Back,
}

/// Unlit material. `color` multiplies the texture once it is ready; until
/// then (or if it failed) the mesh is drawn in `color` alone.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub texture: Option<TextureId>,
    pub side: Side,
}

impl Material {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    pub fn solid(color: [f32; 4]) -> Self {
        Self {
            color,
            texture: None,
            side: Side::Front,
        }
    }

    pub fn textured(texture: TextureId) -> Self {
        Self {
            color: Self::WHITE,
            texture: Some(texture),
            side: Side::Front,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color[3] = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn is_translucent(&self) -> bool {
        self.color[3] < 1.0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::solid(Self::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::{Material, Side};
    use crate::world::TextureId;

    #[test]
    fn opacity_marks_translucent() {
        let m = Material::textured(TextureId(0))
            .with_opacity(0.5)
            .with_side(Side::Back);
        assert!(m.is_translucent());
        assert_eq!(m.side, Side::Back);
        assert!(!Material::default().is_translucent());
    }
}
