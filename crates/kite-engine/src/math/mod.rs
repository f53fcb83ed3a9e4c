//! Small math types shared by resources and backends.
//!
//! Canonical CPU space:
//! - Pixels, origin top-left
//! - +X right, +Y down
//!
//! Texture coordinates are normalized, origin top-left.

mod pot;
mod transform;
mod vertex;

pub use pot::{is_power_of_two, next_power_of_two};
pub use transform::{DrawParams, Transform};
pub use vertex::Vertex;
