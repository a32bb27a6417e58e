//! Application event loop.
//!
//! [`run`] opens a window (or mounts into a canvas on the web), creates the GPU context,
//! constructs a [`SceneView`] on a [`GpuBackend`] and drives it from winit's redraw
//! events. The host side of the frame callback is a [`Host`]: the loop keeps asking for
//! redraws only while the view's frame handle is scheduled there.
//!
//! Each redraw
//! 1. advances the landing page timers ([`DemoShell`])
//! 2. calls [`SceneView::frame`]
//! 3. requests the next redraw if the view is still running
//!
//! Closing the window stops the view before the loop exits.

use std::sync::Arc;

use instant::Instant;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    backend::gpu::GpuBackend,
    config::{SceneConfig, SurfaceSize},
    context::Context,
    error::SceneError,
    host::{Host, SharedHost},
    shell::DemoShell,
    view::{FrameOutcome, SceneView},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum AppEvent {
    /// Sent by the web build once the asynchronous device request has finished.
    #[allow(dead_code)]
    ContextReady(Result<Context, SceneError>),
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextReady(Ok(_)) => f.write_str("ContextReady(Ok)"),
            Self::ContextReady(Err(e)) => f.debug_tuple("ContextReady").field(e).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    config: SceneConfig,
    host: SharedHost,
    window: Option<Arc<Window>>,
    view: Option<SceneView<GpuBackend>>,
    shell: DemoShell,
    last_time: Instant,
    last_percent: u32,
    failure: Option<SceneError>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let shell = DemoShell::new(config.seed);
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            host: Host::shared(),
            window: None,
            view: None,
            shell,
            last_time: Instant::now(),
            last_percent: 0,
            failure: None,
        })
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>, SceneError> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(format!("glow-ngin: {}", self.config.content.name()));

        #[cfg(not(target_arch = "wasm32"))]
        {
            window_attributes = window_attributes.with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.size.width,
                self.config.size.height,
            ));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_canvas(Some(canvas(&self.config.canvas_id)?));
        }

        event_loop
            .create_window(window_attributes)
            .map(Arc::new)
            .map_err(|e| SceneError::MountTargetUnavailable(e.to_string()))
    }

    /// The window's size, or the configured one while the window has no area yet.
    fn mount_size(&self, window: &Window) -> SurfaceSize {
        let size = SurfaceSize::from(window.inner_size());
        if size.is_empty() { self.config.size } else { size }
    }

    fn mount(&mut self, ctx: Context) -> Result<(), SceneError> {
        let window = ctx.window().clone();
        let mut config = self.config.clone();
        config.size = self.mount_size(&window);

        let mut view = SceneView::construct(self.host.clone(), config, GpuBackend::new(ctx))?;
        view.start()?;
        self.shell.progress.start();
        self.last_time = Instant::now();
        window.request_redraw();
        self.window = Some(window);
        self.view = Some(view);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: SceneError) {
        error!("could not mount the scene: {e}");
        self.failure = Some(e);
        event_loop.exit();
    }
}

#[cfg(target_arch = "wasm32")]
fn canvas(id: &str) -> Result<web_sys::HtmlCanvasElement, SceneError> {
    use wasm_bindgen::JsCast;

    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
        .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        .ok_or_else(|| SceneError::MountTargetUnavailable(format!("no canvas with id '{id}'")))
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.view.is_some() || self.window.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e),
        };
        let size = self.mount_size(&window);
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self
                .async_runtime
                .block_on(Context::new(window, size))
                .and_then(|ctx| self.mount(ctx));
            if let Err(e) = result {
                self.fail(event_loop, e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let ctx = Context::new(window, size).await;
                if proxy.send_event(AppEvent::ContextReady(ctx)).is_err() {
                    log::warn!("event loop closed before the graphics context was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            AppEvent::ContextReady(result) => {
                if let Err(e) = result.and_then(|ctx| self.mount(ctx)) {
                    self.fail(event_loop, e);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(view), Some(window)) = (self.view.as_mut(), self.window.as_ref()) else {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
            }
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, stopping the scene");
                view.stop();
                self.view = None;
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now - self.last_time;
                self.last_time = now;

                self.shell.tick(dt);
                let percent = self.shell.progress.percent();
                if percent != self.last_percent {
                    self.last_percent = percent;
                    info!(
                        "analysis {percent}% (step {}/{}){}",
                        self.shell.steps.current() + 1,
                        DemoShell::STEPS,
                        if self.shell.glitch.is_glitching() { " *glitch*" } else { "" }
                    );
                }

                if view.frame() == FrameOutcome::Failed {
                    warn!("frame failed, {} failures so far", view.stats().failed);
                }
                let scheduled = view
                    .frame_handle()
                    .is_some_and(|handle| self.host.borrow().is_scheduled(handle));
                if scheduled {
                    window.request_redraw();
                }
            }
            other => {
                view.on_window_event(&other);
            }
        }
    }
}

/// Runs `config` in a window until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("could not initialize logger: {e}").into());
        }
    }

    info!(
        "mounting '{}' (bloom: {}, antialias: {})",
        config.content.name(),
        config.bloom.is_some(),
        config.antialias
    );

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Browser entry point: the helix with bloom in the canvas with id `canvas`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    use crate::config::{BloomSettings, SceneContent};

    run(SceneConfig::new(SceneContent::Helix).with_bloom(BloomSettings::default()))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
