//! Selective bloom.
//!
//! Only nodes on [`Layer::Glow`] should bloom. The glow pass therefore renders the scene
//! with every other renderable temporarily wearing [`Material::dark`], so they still
//! occlude glowing nodes but contribute no light. The swap is held by a
//! [`GlowIsolation`] guard whose `Drop` puts the original materials back, whether the
//! pass returns, fails or unwinds.

use log::trace;

use crate::{
    backend::{PassTarget, RenderBackend},
    camera::Camera,
    config::BloomSettings,
    data_structures::{
        material::Material,
        scene_graph::{Layer, NodeId, Scene},
        uniforms::UniformSet,
    },
    error::SceneError,
};

/// Scoped material swap for the glow pass.
pub struct GlowIsolation<'a> {
    scene: &'a mut Scene,
    saved: Vec<(NodeId, Material)>,
}

impl<'a> GlowIsolation<'a> {
    pub fn isolate(scene: &'a mut Scene) -> Self {
        let saved = scene
            .iter_mut()
            .filter(|(_, node)| node.layer != Layer::Glow)
            .filter_map(|(id, node)| {
                node.material_mut()
                    .map(|material| (id, std::mem::replace(material, Material::dark())))
            })
            .collect::<Vec<_>>();
        trace!("glow isolation darkened {} nodes", saved.len());
        Self { scene, saved }
    }

    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    pub fn darkened(&self) -> usize {
        self.saved.len()
    }
}

impl Drop for GlowIsolation<'_> {
    fn drop(&mut self) {
        for (id, material) in self.saved.drain(..) {
            if let Some(slot) = self.scene.get_mut(id).and_then(|node| node.material_mut()) {
                *slot = material;
            }
        }
    }
}

/// Glow pass, base pass, then composite. The frame must already be begun.
pub fn render_bloom<B: RenderBackend + ?Sized>(
    backend: &mut B,
    scene: &mut Scene,
    camera: &Camera,
    uniforms: &UniformSet,
    settings: &BloomSettings,
) -> Result<(), SceneError> {
    {
        let isolation = GlowIsolation::isolate(scene);
        backend.draw(isolation.scene(), camera, uniforms, PassTarget::Glow)?;
    }
    backend.draw(scene, camera, uniforms, PassTarget::Base)?;
    backend.composite(settings)
}

/// Gaussian weights of the separable blur, centre tap first.
pub const BLUR_WEIGHTS: [f32; 5] = [0.227_027, 0.194_594_6, 0.121_621_6, 0.054_054, 0.016_216];

/// One direction of one blur round.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniform {
    /// Texel step along the blur axis, already scaled by the radius.
    pub step: [f32; 2],
    _padding: [f32; 2],
    pub weights: [f32; 4],
    pub outer_weight: [f32; 4],
}

impl BlurUniform {
    pub fn new(horizontal: bool, texel: [f32; 2], radius: f32) -> Self {
        let step = if horizontal {
            [texel[0] * radius, 0.0]
        } else {
            [0.0, texel[1] * radius]
        };
        Self {
            step,
            _padding: [0.0; 2],
            weights: [BLUR_WEIGHTS[0], BLUR_WEIGHTS[1], BLUR_WEIGHTS[2], BLUR_WEIGHTS[3]],
            outer_weight: [BLUR_WEIGHTS[4], 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniform {
    pub strength: f32,
    _padding: [f32; 3],
}

impl CompositeUniform {
    pub fn new(settings: &BloomSettings) -> Self {
        Self {
            strength: settings.strength,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{geometry, instance::Instance, scene_graph::NodeKind};

    fn two_node_scene() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let sphere = scene.add_geometry(geometry::uv_sphere(0.05, 8, 8));
        let glow = scene.add(
            "bulb",
            NodeKind::Mesh {
                geometry: sphere,
                material: Material::basic([1.0, 0.6, 0.0]),
            },
            Instance::new(),
        );
        scene.set_layer(glow, Layer::Glow);
        let base = scene.add(
            "rock",
            NodeKind::Mesh {
                geometry: sphere,
                material: Material::standard([0.5; 3]),
            },
            Instance::new(),
        );
        (scene, glow, base)
    }

    #[test]
    fn isolation_darkens_only_non_glow_nodes_and_restores() {
        let (mut scene, glow, base) = two_node_scene();
        {
            let isolation = GlowIsolation::isolate(&mut scene);
            assert_eq!(isolation.darkened(), 1);
            let scene = isolation.scene();
            assert_eq!(scene.get(base).unwrap().material(), Some(&Material::dark()));
            assert_eq!(
                scene.get(glow).unwrap().material(),
                Some(&Material::basic([1.0, 0.6, 0.0]))
            );
        }
        assert_eq!(
            scene.get(base).unwrap().material(),
            Some(&Material::standard([0.5; 3]))
        );
    }

    #[test]
    fn blur_weights_sum_to_one() {
        let total = BLUR_WEIGHTS[0] + 2.0 * BLUR_WEIGHTS[1..].iter().sum::<f32>();
        assert!((total - 1.0).abs() < 1e-3);
        assert_eq!(std::mem::size_of::<BlurUniform>() % 16, 0);
        assert_eq!(BlurUniform::new(false, [0.5, 0.25], 2.0).step, [0.0, 0.5]);
    }
}
