pub mod camera;
pub mod components;
pub mod entity;
pub mod geometry;
pub mod mesh;
pub mod orbit;
pub mod picking;
pub mod prefabs;
pub mod world;

pub use world::*;
