pub mod mat4;
pub mod precision;
pub mod rotation;
pub mod vec;

pub use mat4::*;
pub use precision::*;
pub use rotation::*;
pub use vec::*;
