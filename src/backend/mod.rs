//! Render backends.
//!
//! A [`RenderBackend`] turns a scene, camera and uniform set into pixels. The view drives
//! it through one fixed sequence per frame:
//!
//! 1. [`begin_frame`](RenderBackend::begin_frame) acquires the output image
//! 2. one [`draw`](RenderBackend::draw) per pass (a single `Surface` pass, or `Glow` then
//!    `Base` when bloom is on)
//! 3. [`composite`](RenderBackend::composite) when bloom is on
//! 4. [`end_frame`](RenderBackend::end_frame) presents, or
//!    [`abort_frame`](RenderBackend::abort_frame) when a step failed
//!
//! Everything a backend allocates is registered with the [`ResourceSet`] passed to
//! [`acquire`](RenderBackend::acquire) and [`resize`](RenderBackend::resize), which is
//! what eventually frees it.
//!
//! - [`gpu::GpuBackend`] renders with WGPU into a winit window or canvas
//! - [`headless::HeadlessBackend`] records calls without touching a GPU

pub mod gpu;
pub mod headless;

use crate::{
    camera::Camera,
    config::{BloomSettings, SceneConfig, SurfaceSize},
    data_structures::{scene_graph::Scene, uniforms::UniformSet},
    error::SceneError,
    resources::ResourceSet,
};

/// Where a draw call renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassTarget {
    /// Straight to the presented image.
    Surface,
    /// Offscreen image holding only glowing nodes, blurred during composite.
    Glow,
    /// Offscreen image of the full scene, the composite's base layer.
    Base,
}

pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Creates the rendering context, pipelines, geometry buffers and render targets for
    /// `scene`. On error the caller releases whatever was registered so far.
    fn acquire(
        &mut self,
        scene: &Scene,
        config: &SceneConfig,
        resources: &mut ResourceSet,
    ) -> Result<(), SceneError>;

    /// Reconfigures the surface and recreates every size dependent target.
    fn resize(&mut self, size: SurfaceSize, resources: &mut ResourceSet) -> Result<(), SceneError>;

    fn size(&self) -> SurfaceSize;

    fn begin_frame(&mut self) -> Result<(), SceneError>;

    fn draw(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        uniforms: &UniformSet,
        target: PassTarget,
    ) -> Result<(), SceneError>;

    /// Blurs the glow target and adds it onto the base target in the output image.
    fn composite(&mut self, settings: &BloomSettings) -> Result<(), SceneError>;

    fn end_frame(&mut self) -> Result<(), SceneError>;

    /// Drops the frame in flight without presenting it.
    fn abort_frame(&mut self) {}
}
