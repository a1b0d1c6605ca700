//! Fixed parameters of the pipeline.

pub mod render;
