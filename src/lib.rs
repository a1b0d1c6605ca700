#![allow(missing_docs)]

pub mod backend;
pub mod error;
pub mod preset;
pub mod render;
pub mod scene;

pub use error::Error;
pub use render::{
    AccessPattern, RenderOptions, RenderOutput, Renderer, View,
};
pub use scene::{Scene, SceneBuilder};
