//! WGPU objects as [`Disposable`] entries.
//!
//! WGPU handles are reference counted, so the backend keeps its own clone for drawing and
//! hands another to the resource set. Buffers, textures and the device are destroyed
//! explicitly, which frees their memory even while other clones are still around.

use super::{Disposable, ResourceKind};

#[derive(Debug)]
pub enum GpuResource {
    Device(wgpu::Device),
    /// Vertex and index data of a geometry.
    GeometryBuffer(wgpu::Buffer),
    /// Per-node instance data carrying the node's material.
    MaterialBuffer(wgpu::Buffer),
    Buffer(wgpu::Buffer),
    Texture(wgpu::Texture),
    Pipeline(wgpu::RenderPipeline),
}

impl Disposable for GpuResource {
    fn kind(&self) -> ResourceKind {
        match self {
            GpuResource::Device(_) => ResourceKind::Context,
            GpuResource::GeometryBuffer(_) => ResourceKind::Geometry,
            GpuResource::MaterialBuffer(_) => ResourceKind::Material,
            GpuResource::Buffer(_) => ResourceKind::Buffer,
            GpuResource::Texture(_) => ResourceKind::Texture,
            GpuResource::Pipeline(_) => ResourceKind::Pipeline,
        }
    }

    fn release(self: Box<Self>) {
        match *self {
            GpuResource::Device(device) => device.destroy(),
            GpuResource::GeometryBuffer(buffer)
            | GpuResource::MaterialBuffer(buffer)
            | GpuResource::Buffer(buffer) => buffer.destroy(),
            GpuResource::Texture(texture) => texture.destroy(),
            // no explicit destroy, dropping the last handle frees it
            GpuResource::Pipeline(_) => {}
        }
    }
}

impl GpuResource {
    pub fn boxed(self) -> Box<dyn Disposable> {
        Box::new(self)
    }
}
