pub mod globe;
pub mod icon;
pub mod nebula;
pub mod starfield;

pub use globe::*;
pub use icon::*;
pub use nebula::*;
pub use starfield::*;
