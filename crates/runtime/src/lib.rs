pub mod frame;
pub mod frame_loop;
pub mod subscription;

pub use frame::*;
pub use frame_loop::*;
pub use subscription::*;
