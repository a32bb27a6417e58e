//! Scene view lifecycle.
//!
//! A [`SceneView`] is one mounted 3D scene: it owns a scene graph, a camera, a uniform
//! set, an animation driver, a render backend and every resource that backend acquired.
//! The lifecycle is
//!
//! ```text
//! Unmounted --construct--> Constructing --start--> Running --stop--> Stopping --> Unmounted
//! ```
//!
//! - [`SceneView::construct`] validates the mount target, builds the content and lets the
//!   backend acquire its resources. Failure releases whatever was acquired; no view exists.
//! - [`SceneView::start`] registers the recurring frame callback with the [`Host`] and
//!   subscribes to viewport events.
//! - [`SceneView::frame`] is the body of that callback. Errors inside a frame are logged
//!   and counted, and the callback stays armed.
//! - [`SceneView::stop`] cancels the frame callback first, then the subscriptions, then
//!   releases resources newest first. It is idempotent and also runs on drop.
//!
//! [`Host`]: crate::host::Host

use log::{debug, error, info, trace};
use rand::{SeedableRng, rngs::SmallRng};
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::{
    animation::Animator,
    backend::{PassTarget, RenderBackend},
    bloom,
    camera::{Camera, OrbitController},
    clock::{FrameClock, FrameTime, InstantClock},
    config::{SceneConfig, SurfaceSize},
    content::{self, Content},
    data_structures::{scene_graph::Scene, uniforms::UniformSet},
    error::SceneError,
    host::{EventKind, FrameHandle, ListenerId, Registrations, SharedHost},
    input::ViewportAdapter,
    resources::ResourceSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unmounted,
    /// Constructed and holding resources, frame callback not registered yet.
    Constructing,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Arrived sooner than the configured frame rate allows.
    Throttled,
    /// The view is not running or its frame callback is not scheduled.
    Skipped,
    /// Something in the frame failed; it was logged and the next frame runs as usual.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub rendered: u64,
    pub throttled: u64,
    pub failed: u64,
}

/// Everything the frame callback reads and writes.
pub struct FrameState {
    pub scene: Scene,
    pub camera: Camera,
    pub uniforms: UniformSet,
    pub controller: Option<OrbitController>,
    pub viewport: ViewportAdapter,
    animator: Box<dyn Animator>,
}

pub struct SceneView<B: RenderBackend> {
    host: SharedHost,
    config: SceneConfig,
    backend: B,
    resources: ResourceSet,
    state: FrameState,
    clock: Box<dyn FrameClock>,
    lifecycle: Lifecycle,
    registrations: Option<Registrations>,
    frames: Option<FrameHandle>,
    listeners: Vec<(EventKind, ListenerId)>,
    last_frame: Option<f32>,
    stats: FrameStats,
}

impl<B: RenderBackend> SceneView<B> {
    pub fn construct(host: SharedHost, config: SceneConfig, mut backend: B) -> Result<Self, SceneError> {
        config.validate()?;
        info!(
            "constructing '{}' view at {}x{} on {}",
            config.content.name(),
            config.size.width,
            config.size.height,
            backend.name()
        );

        let mut scene = Scene::new();
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let Content {
            camera,
            animator,
            controller,
        } = content::build(config.content, &mut scene, config.size.aspect(), &mut rng);

        let mut resources = ResourceSet::new();
        if let Err(err) = backend.acquire(&scene, &config, &mut resources) {
            let released = resources.release_all();
            error!("view construction failed, released {} resources: {}", released, err);
            return Err(err);
        }
        debug!("{} resources acquired", resources.acquired());

        let state = FrameState {
            uniforms: UniformSet::new(config.size),
            viewport: ViewportAdapter::new(config.size),
            scene,
            camera,
            controller,
            animator,
        };
        Ok(Self {
            host,
            config,
            backend,
            resources,
            state,
            clock: Box::new(InstantClock::new()),
            lifecycle: Lifecycle::Constructing,
            registrations: None,
            frames: None,
            listeners: Vec::new(),
            last_frame: None,
            stats: FrameStats::default(),
        })
    }

    /// Replaces the wall clock, e.g. with a [`ManualClock`](crate::clock::ManualClock).
    pub fn with_clock(mut self, clock: impl FrameClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn start(&mut self) -> Result<(), SceneError> {
        if self.lifecycle != Lifecycle::Constructing {
            return Err(SceneError::Lifecycle {
                action: "start",
                state: self.lifecycle,
            });
        }
        let mut host = self.host.borrow_mut();
        self.registrations = Some(host.registrations());
        self.frames = Some(host.request_frames());
        self.listeners.push((EventKind::Resize, host.subscribe(EventKind::Resize)));
        if self.config.content.tracks_pointer() || self.state.controller.is_some() {
            self.listeners
                .push((EventKind::PointerMove, host.subscribe(EventKind::PointerMove)));
        }
        drop(host);
        self.lifecycle = Lifecycle::Running;
        info!("'{}' view running", self.config.content.name());
        Ok(())
    }

    fn is_scheduled(&self) -> bool {
        match (self.frames, &self.registrations) {
            (Some(handle), Some(registrations)) => registrations.is_scheduled(handle),
            _ => false,
        }
    }

    /// One tick of the frame callback.
    pub fn frame(&mut self) -> FrameOutcome {
        if self.lifecycle != Lifecycle::Running || !self.is_scheduled() {
            return FrameOutcome::Skipped;
        }
        let now = self.clock.elapsed();
        if let (Some(min), Some(last)) = (self.config.min_frame_interval(), self.last_frame) {
            if now - last < min {
                self.stats.throttled += 1;
                return FrameOutcome::Throttled;
            }
        }
        let delta = self.last_frame.map_or(0.0, |last| now - last);
        self.last_frame = Some(now);

        match self.render_frame(FrameTime { elapsed: now, delta }) {
            Ok(()) => {
                self.stats.rendered += 1;
                trace!("frame {} at t={:.3}", self.stats.rendered, now);
                FrameOutcome::Rendered
            }
            Err(err) => {
                self.backend.abort_frame();
                self.stats.failed += 1;
                error!("unable to render frame: {}", err);
                FrameOutcome::Failed
            }
        }
    }

    fn render_frame(&mut self, time: FrameTime) -> Result<(), SceneError> {
        let FrameState {
            scene,
            camera,
            uniforms,
            controller,
            viewport,
            animator,
        } = &mut self.state;

        viewport.apply_pending(camera, &mut self.backend, uniforms, &mut self.resources)?;
        animator.update(scene, uniforms, time);
        if let Some(controller) = controller {
            controller.update(camera, time.delta);
        }
        scene.update_world_transforms();

        self.backend.begin_frame()?;
        match &self.config.bloom {
            Some(settings) => bloom::render_bloom(&mut self.backend, scene, camera, uniforms, settings)?,
            None => self.backend.draw(scene, camera, uniforms, PassTarget::Surface)?,
        }
        self.backend.end_frame()
    }

    /// Queues a resize for the next frame.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.state.viewport.request_resize(size);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let FrameState {
            uniforms,
            controller,
            viewport,
            ..
        } = &mut self.state;
        viewport.pointer_move(x, y, uniforms);
        if let Some(controller) = controller {
            viewport.drag(x, y, controller);
        }
    }

    pub fn pointer_pressed(&mut self, pressed: bool) {
        self.state.viewport.pointer_pressed(pressed);
    }

    fn listens_to(&self, kind: EventKind) -> bool {
        self.listeners.iter().any(|(k, _)| *k == kind)
    }

    /// Forwards the window events this view subscribed to. Returns whether it consumed one.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::Resized(size) if self.listens_to(EventKind::Resize) => {
                self.resize((*size).into());
                true
            }
            WindowEvent::CursorMoved { position, .. } if self.listens_to(EventKind::PointerMove) => {
                self.pointer_move(position.x, position.y);
                true
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } if self.listens_to(EventKind::PointerMove) => {
                self.pointer_pressed(*state == ElementState::Pressed);
                true
            }
            _ => false,
        }
    }

    /// Unmounts the view. Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        self.lifecycle = Lifecycle::Stopping;
        if let Some(registrations) = self.registrations.take() {
            if let Some(handle) = self.frames.take() {
                registrations.cancel_frames(handle);
            }
            for (kind, id) in self.listeners.drain(..) {
                registrations.unsubscribe(kind, id);
            }
        }
        let released = self.resources.release_all();
        self.state.scene.clear();
        self.lifecycle = Lifecycle::Unmounted;
        info!(
            "'{}' view stopped: {} resources released, {} frames rendered, {} failed",
            self.config.content.name(),
            released,
            self.stats.rendered,
            self.stats.failed
        );
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.state.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.state.camera
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.state.uniforms
    }

    pub fn controller(&self) -> Option<&OrbitController> {
        self.state.controller.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn frame_handle(&self) -> Option<FrameHandle> {
        self.frames
    }
}

impl<B: RenderBackend> Drop for SceneView<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
