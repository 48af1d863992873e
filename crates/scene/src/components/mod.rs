pub mod collider;
pub mod drawable3d;
pub mod material;
pub mod transform;

pub use collider::*;
pub use drawable3d::*;
pub use material::*;
pub use transform::*;
