//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - reporting device capabilities relevant to textures

mod gpu;
mod init;

pub use gpu::GpuContext;
pub use init::GpuInit;
