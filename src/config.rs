//! View configuration.
//!
//! A [`SceneConfig`] is handed to [`SceneView::construct`](crate::view::SceneView::construct)
//! and fixes everything the view needs before the first frame: the initial surface size,
//! which visual content to build, antialiasing, and whether the selective bloom path runs.

use crate::error::SceneError;

/// Width and height of a drawing surface in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl From<(u32, u32)> for SurfaceSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Which backdrop a view draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneContent {
    /// Hero section: twisting helix of play icons joined by a tube, floating particles,
    /// cyan and magenta point lights and an auto-rotating orbit camera.
    #[default]
    Helix,
    /// Dense point cloud lit by three orbiting coloured lights; the light bulbs glow.
    ParticleField,
    /// Fullscreen quad shaded by a time and pointer driven fragment shader.
    ShaderBackdrop,
    /// Single lit cube spinning at a constant rate.
    SpinningCube,
}

impl SceneContent {
    pub fn name(&self) -> &'static str {
        match self {
            SceneContent::Helix => "helix",
            SceneContent::ParticleField => "particles",
            SceneContent::ShaderBackdrop => "backdrop",
            SceneContent::SpinningCube => "cube",
        }
    }

    /// Whether pointer movement feeds this content (the backdrop's mouse light).
    pub fn tracks_pointer(&self) -> bool {
        matches!(self, SceneContent::ShaderBackdrop)
    }
}

/// Tuning of the glow post-processing path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Multiplier applied to the blurred glow before it is added to the base image.
    pub strength: f32,
    /// Blur kernel spread in texels of the half-resolution glow target.
    pub radius: f32,
    /// Horizontal + vertical blur rounds.
    pub iterations: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 1.0,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub size: SurfaceSize,
    pub content: SceneContent,
    pub antialias: bool,
    pub bloom: Option<BloomSettings>,
    /// Frames arriving sooner than `1 / max_fps` seconds after the last rendered one are skipped.
    pub max_fps: Option<u32>,
    /// Seed for the one-time random placement done while building content.
    pub seed: u64,
    /// Id of the canvas element to mount into when running in a browser.
    pub canvas_id: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            size: SurfaceSize::new(800, 600),
            content: SceneContent::default(),
            antialias: true,
            bloom: None,
            max_fps: None,
            seed: 0x7b1e_5eed,
            canvas_id: "canvas".to_string(),
        }
    }
}

impl SceneConfig {
    pub fn new(content: SceneContent) -> Self {
        let mut config = Self {
            content,
            ..Default::default()
        };
        // The backdrop throttles itself to 60 fps.
        if content == SceneContent::ShaderBackdrop {
            config.max_fps = Some(60);
        }
        config
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = SurfaceSize::new(width, height);
        self
    }

    pub fn with_bloom(mut self, bloom: BloomSettings) -> Self {
        self.bloom = Some(bloom);
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn with_max_fps(mut self, max_fps: Option<u32>) -> Self {
        self.max_fps = max_fps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_canvas_id(mut self, canvas_id: impl Into<String>) -> Self {
        self.canvas_id = canvas_id.into();
        self
    }

    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }

    pub fn min_frame_interval(&self) -> Option<f32> {
        self.max_fps.map(|fps| 1.0 / fps as f32)
    }

    /// Rejects configurations no backend can honour. A zero-sized surface means there is
    /// nothing to mount into.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.size.is_empty() {
            return Err(SceneError::MountTargetUnavailable(format!(
                "surface has no area ({}x{})",
                self.size.width, self.size.height
            )));
        }
        if let Some(0) = self.max_fps {
            return Err(SceneError::InvalidConfig("max_fps must be positive".to_string()));
        }
        if let Some(bloom) = &self.bloom {
            if !(bloom.strength.is_finite() && bloom.strength >= 0.0) {
                return Err(SceneError::InvalidConfig(format!(
                    "bloom strength must be a non-negative number, got {}",
                    bloom.strength
                )));
            }
            if bloom.iterations == 0 {
                return Err(SceneError::InvalidConfig(
                    "bloom needs at least one blur iteration".to_string(),
                ));
            }
        }
        Ok(())
    }
}
