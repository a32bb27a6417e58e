//! Viewport and pointer handling.
//!
//! Window events arrive between frames. The [`ViewportAdapter`] only records them; the
//! frame callback applies the latest pending size before animating and rendering, so the
//! camera, the surface, the render targets and the `resolution` uniform all change in
//! the same step.

use cgmath::Vector2;
use log::{debug, trace};

use crate::{
    backend::RenderBackend,
    camera::{Camera, OrbitController},
    config::SurfaceSize,
    data_structures::uniforms::UniformSet,
    error::SceneError,
    resources::ResourceSet,
};

/// Maps a pixel position to uniform space: x right and y up, both in [-1, 1].
pub fn normalize_pointer(x: f64, y: f64, width: u32, height: u32) -> Vector2<f32> {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    Vector2::new((x / w * 2.0 - 1.0) as f32, (-(y / h) * 2.0 + 1.0) as f32)
}

/// Radians of orbit per dragged pixel.
const DRAG_SPEED: f32 = 2.0 * std::f32::consts::PI;

#[derive(Debug, Clone, Default)]
pub struct ViewportAdapter {
    size: SurfaceSize,
    pending: Option<SurfaceSize>,
    dragging: bool,
    last_pointer: Option<(f64, f64)>,
}

impl ViewportAdapter {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Records a resize for the next frame. Only the latest one is kept.
    pub fn request_resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            trace!("ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        self.pending = Some(size);
    }

    pub fn pending(&self) -> Option<SurfaceSize> {
        self.pending
    }

    /// Applies the pending resize, if any. A failed resize stays pending for the next frame.
    pub fn apply_pending<B: RenderBackend + ?Sized>(
        &mut self,
        camera: &mut Camera,
        backend: &mut B,
        uniforms: &mut UniformSet,
        resources: &mut ResourceSet,
    ) -> Result<bool, SceneError> {
        let Some(size) = self.pending.take() else {
            return Ok(false);
        };
        if let Err(err) = self.handle_resize(size, camera, backend, uniforms, resources) {
            self.pending = Some(size);
            return Err(err);
        }
        Ok(true)
    }

    /// Resizes the surface and render targets, then the camera aspect and the resolution
    /// uniform. Nothing but the backend is touched if the backend fails.
    /// A zero-sized surface (minimised window, collapsed container) changes nothing.
    pub fn handle_resize<B: RenderBackend + ?Sized>(
        &mut self,
        size: SurfaceSize,
        camera: &mut Camera,
        backend: &mut B,
        uniforms: &mut UniformSet,
        resources: &mut ResourceSet,
    ) -> Result<(), SceneError> {
        if size.is_empty() {
            return Ok(());
        }
        debug!("resize {}x{} -> {}x{}", self.size.width, self.size.height, size.width, size.height);
        backend.resize(size, resources)?;
        camera.set_aspect(size.aspect());
        uniforms.resolution = Vector2::new(size.width as f32, size.height as f32);
        self.size = size;
        Ok(())
    }

    /// Stores the pointer in the `mouse` uniform. Nothing is rendered here; the next frame
    /// picks the value up.
    pub fn pointer_move(&mut self, x: f64, y: f64, uniforms: &mut UniformSet) {
        uniforms.mouse = normalize_pointer(x, y, self.size.width, self.size.height);
    }

    pub fn pointer_pressed(&mut self, pressed: bool) {
        self.dragging = pressed;
        if !pressed {
            self.last_pointer = None;
        }
    }

    /// Turns pointer movement while pressed into orbit rotation.
    pub fn drag(&mut self, x: f64, y: f64, controller: &mut OrbitController) {
        if self.dragging {
            if let Some((last_x, last_y)) = self.last_pointer {
                let height = self.size.height.max(1) as f32;
                let d_azimuth = -((x - last_x) as f32) / height * DRAG_SPEED;
                let d_polar = -((y - last_y) as f32) / height * DRAG_SPEED;
                controller.rotate(d_azimuth, d_polar);
            }
        }
        self.last_pointer = Some((x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;

    #[test]
    fn centre_of_full_hd_is_origin() {
        let p = normalize_pointer(960.0, 540.0, 1920, 1080);
        assert_eq!(p, Vector2::new(0.0, 0.0));
        let corner = normalize_pointer(0.0, 0.0, 1920, 1080);
        assert_eq!(corner, Vector2::new(-1.0, 1.0));
    }

    #[test]
    fn latest_pending_resize_wins() {
        let mut adapter = ViewportAdapter::new(SurfaceSize::new(800, 600));
        adapter.request_resize(SurfaceSize::new(1024, 768));
        adapter.request_resize(SurfaceSize::new(0, 768));
        adapter.request_resize(SurfaceSize::new(1280, 720));
        assert_eq!(adapter.pending(), Some(SurfaceSize::new(1280, 720)));
    }

    #[test]
    fn drag_only_rotates_while_pressed() {
        let camera = Camera::perspective(60.0, 1.0, 0.1, 100.0).at((0.0, 0.0, 3.0));
        let mut controller = OrbitController::from_camera(&camera);
        let mut adapter = ViewportAdapter::new(SurfaceSize::new(100, 100));
        let mut resting = camera.clone();
        controller.update(&mut resting, 0.0);

        adapter.drag(10.0, 10.0, &mut controller);
        adapter.drag(20.0, 10.0, &mut controller);
        let mut moved = camera.clone();
        controller.update(&mut moved, 0.0);
        assert_eq!(moved.position, resting.position);

        adapter.pointer_pressed(true);
        adapter.drag(30.0, 10.0, &mut controller);
        controller.update(&mut moved, 0.0);
        assert!((moved.position.x - resting.position.x).abs() > 0.1);
    }

    #[test]
    fn default_adapter_has_no_area_and_nothing_pending() {
        let adapter = ViewportAdapter::default();
        assert!(adapter.size().is_empty());
        assert_eq!(adapter.pending(), None);
    }

    #[test]
    fn failed_resize_keeps_camera_and_uniforms_and_stays_pending() {
        let size = SurfaceSize::new(800, 600);
        let larger = SurfaceSize::new(1024, 768);
        let mut camera = Camera::perspective(60.0, size.aspect(), 0.1, 100.0);
        let mut uniforms = UniformSet::new(size);
        let mut resources = ResourceSet::new();
        let mut backend = HeadlessBackend::new();
        backend.set_fail_resize(true);
        let mut adapter = ViewportAdapter::new(size);
        adapter.request_resize(larger);

        assert!(adapter
            .apply_pending(&mut camera, &mut backend, &mut uniforms, &mut resources)
            .is_err());
        assert_eq!(adapter.size(), size);
        assert_eq!(adapter.pending(), Some(larger));
        assert!((camera.aspect() - size.aspect()).abs() < 1e-6);
        assert_eq!(uniforms.resolution, Vector2::new(800.0, 600.0));
        assert_eq!(resources.live(), 0);

        backend.set_fail_resize(false);
        assert!(adapter
            .apply_pending(&mut camera, &mut backend, &mut uniforms, &mut resources)
            .unwrap());
        assert_eq!(adapter.size(), larger);
        assert_eq!(adapter.pending(), None);
        assert!((camera.aspect() - larger.aspect()).abs() < 1e-6);
        assert_eq!(uniforms.resolution, Vector2::new(1024.0, 768.0));
    }
}
