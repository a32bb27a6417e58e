//! glow-ngin
//!
//! Lifecycle-managed 3D scenes for animated landing-page backdrops, rendered with wgpu on
//! native targets and in the browser. A scene view is constructed into a mount target,
//! started, driven one frame at a time and stopped; everything it acquired on the GPU is
//! released exactly once, newest first, when it stops.
//!
//! High-level modules
//! - `view`: the scene view lifecycle and the per-frame sequence
//! - `content`: the four scene builders (helix, particle field, shader backdrop, cube)
//! - `animation`: time-driven animators that mutate scene nodes and uniforms
//! - `bloom`: glow-layer isolation and the selective bloom frame
//! - `input`: viewport adapter for resize and pointer events
//! - `backend`: the render backend seam with a wgpu and a headless implementation
//! - `resources`: the disposal registry every acquired resource goes through
//! - `data_structures`: scene graph, geometry, materials, instances, textures, uniforms
//! - `camera`: perspective/orthographic cameras and the orbit controller
//! - `pipelines`: render pipelines and WGSL shaders
//! - `host`: frame callback and event subscription bookkeeping
//! - `shell`: the landing page's progress, step and glitch timers
//! - `flow`: the winit event loop that ties a view to a window
//!

pub mod animation;
pub mod backend;
pub mod bloom;
pub mod camera;
pub mod clock;
pub mod config;
pub mod content;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod host;
pub mod input;
pub mod pipelines;
pub mod resources;
pub mod shell;
pub mod view;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::{BloomSettings, SceneConfig, SceneContent, SurfaceSize};
pub use error::SceneError;
pub use flow::run;
pub use view::{FrameOutcome, Lifecycle, SceneView};
pub use winit::event::WindowEvent;
