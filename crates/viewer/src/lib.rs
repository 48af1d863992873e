//! Platform-neutral scene session: everything between the host's event loop
//! and the scene crates.

pub mod assets;
pub mod input;
pub mod links;
pub mod mount;
pub mod picker;
pub mod session;

pub use assets::*;
pub use input::*;
pub use links::*;
pub use mount::*;
pub use picker::*;
pub use session::*;
