//! Compute kernels and the pure functions they share.

pub mod decode;
pub mod frustum;
pub mod lod;
pub mod render;
pub mod resolve;

pub use crate::{
    backend::{ComputeClient, CubeCount, CubeDim, CubePosition, Kernel},
    render::{accumulator, debug},
    scene::{Batch, File, PointBuffers},
};
pub use glam::{Mat4, Vec2, Vec3, Vec4};
