#![allow(dead_code)]

use glow_ngin::{
    backend::headless::{HeadlessBackend, SharedLog},
    clock::ManualClock,
    config::SceneConfig,
    host::{Host, SharedHost},
    view::SceneView,
};

/// A running view on the headless backend plus the handles a test needs to observe it.
pub(crate) struct Mounted {
    pub view: SceneView<HeadlessBackend>,
    pub host: SharedHost,
    pub log: SharedLog,
    pub clock: ManualClock,
}

impl Mounted {
    /// Advances the clock by `seconds` and runs one frame.
    pub fn step(&mut self, seconds: f32) -> glow_ngin::FrameOutcome {
        self.clock.advance(seconds);
        self.view.frame()
    }
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Constructs a view on `backend` without starting it.
pub(crate) fn construct_with(config: SceneConfig, backend: HeadlessBackend) -> Mounted {
    init_logger();
    let host = Host::shared();
    let log = backend.log();
    let clock = ManualClock::new();
    let view = SceneView::construct(host.clone(), config, backend)
        .expect("headless construction should succeed")
        .with_clock(clock.clone());
    Mounted {
        view,
        host,
        log,
        clock,
    }
}

/// Constructs and starts a view.
pub(crate) fn mount_with(config: SceneConfig, backend: HeadlessBackend) -> Mounted {
    let mut mounted = construct_with(config, backend);
    mounted.view.start().expect("a constructed view should start");
    mounted
}

pub(crate) fn mount(config: SceneConfig) -> Mounted {
    mount_with(config, HeadlessBackend::new())
}
