//! Materials owned by renderable nodes.

/// Linear RGB.
pub type Color = [f32; 3];

/// Converts a `0xRRGGBB` literal into a colour.
pub fn hex(rgb: u32) -> Color {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lit by the scene lights, plus an emissive term that ignores lighting.
    Standard {
        color: Color,
        emissive: Color,
        emissive_intensity: f32,
    },
    /// Flat colour, unaffected by lights.
    Basic { color: Color },
    /// Flat colour for point primitives.
    Points { color: Color, size: f32 },
    /// Fullscreen shader fed from the view's uniform set.
    Backdrop,
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Material::Standard {
            color,
            emissive: [0.0; 3],
            emissive_intensity: 0.0,
        }
    }

    pub fn basic(color: Color) -> Self {
        Material::Basic { color }
    }

    pub fn points(color: Color, size: f32) -> Self {
        Material::Points { color, size }
    }

    /// The material non-glowing nodes wear during the glow pass.
    pub fn dark() -> Self {
        Material::Basic { color: [0.0; 3] }
    }

    /// Adds an emissive term; only meaningful on `Standard`.
    pub fn with_emissive(self, emissive: Color, intensity: f32) -> Self {
        match self {
            Material::Standard { color, .. } => Material::Standard {
                color,
                emissive,
                emissive_intensity: intensity,
            },
            other => other,
        }
    }

    pub fn is_backdrop(&self) -> bool {
        matches!(self, Material::Backdrop)
    }

    /// Base colour (rgba), emissive contribution and whether lights apply.
    pub fn shading(&self) -> ([f32; 4], Color, bool) {
        match *self {
            Material::Standard {
                color,
                emissive,
                emissive_intensity,
            } => (
                [color[0], color[1], color[2], 1.0],
                emissive.map(|c| c * emissive_intensity),
                true,
            ),
            Material::Basic { color } | Material::Points { color, .. } => {
                ([color[0], color[1], color[2], 1.0], [0.0; 3], false)
            }
            Material::Backdrop => ([1.0; 4], [0.0; 3], false),
        }
    }
}
