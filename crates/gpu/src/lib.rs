pub mod backend;
pub mod renderer;
pub mod textures;

pub use backend::*;
pub use renderer::*;
pub use textures::*;
