//! Render-ready output
//!
//! The simulation hands the renderer a flat list of instances each frame.
//! GPU pipelines and swapchain handling live outside this crate.

pub mod instance;

pub use instance::{RenderInstance, colors};
