//! Opens one landing-page scene in a window.
//!
//! ```text
//! glow-landing --content helix --bloom
//! glow-landing --content backdrop --max-fps 30
//! ```

use clap::{Parser, ValueEnum};
use glow_ngin::{BloomSettings, SceneConfig, SceneContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ContentArg {
    Helix,
    Particles,
    Backdrop,
    Cube,
}

impl From<ContentArg> for SceneContent {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::Helix => SceneContent::Helix,
            ContentArg::Particles => SceneContent::ParticleField,
            ContentArg::Backdrop => SceneContent::ShaderBackdrop,
            ContentArg::Cube => SceneContent::SpinningCube,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "glow-landing", about = "Animated 3D landing-page scenes")]
struct Args {
    /// Scene to mount
    #[arg(long, value_enum, default_value_t = ContentArg::Helix)]
    content: ContentArg,

    /// Render the glow layer through the selective bloom path
    #[arg(long)]
    bloom: bool,

    /// Bloom strength, only used with --bloom
    #[arg(long, default_value_t = 1.5)]
    bloom_strength: f32,

    /// Disable multisampling
    #[arg(long)]
    no_antialias: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Frame rate cap; the backdrop defaults to 60
    #[arg(long)]
    max_fps: Option<u32>,

    /// Seed for particle placement
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> SceneConfig {
        let mut config = SceneConfig::new(self.content.into())
            .with_size(self.width, self.height)
            .with_antialias(!self.no_antialias);
        if self.bloom {
            config = config.with_bloom(BloomSettings {
                strength: self.bloom_strength,
                ..Default::default()
            });
        }
        if self.max_fps.is_some() {
            config = config.with_max_fps(self.max_fps);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config();
    config.validate()?;
    glow_ngin::run(config)
}
