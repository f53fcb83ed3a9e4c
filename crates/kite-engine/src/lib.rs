//! Kite engine crate.
//!
//! Textures, render targets and the GPU plumbing beneath them. Scripting
//! layers (see `kite-lua`) sit on top of [`graphics::Graphics`].

pub mod backend;
pub mod device;
pub mod graphics;
pub mod logging;
pub mod math;
