//! Uniform data: the per-view [`UniformSet`] and the scene-wide lighting block.

use cgmath::Vector2;

use crate::{
    camera::Camera,
    config::SurfaceSize,
    data_structures::scene_graph::{LightKind, Scene},
};

/// Named shader parameters of one view, created at construction and updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSet {
    /// Seconds since the view started.
    pub time: f32,
    /// Surface size in pixels.
    pub resolution: Vector2<f32>,
    /// Pointer position in [-1, 1] uniform space, y up.
    pub mouse: Vector2<f32>,
}

impl UniformSet {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            time: 0.0,
            resolution: Vector2::new(size.width as f32, size.height as f32),
            mouse: Vector2::new(0.0, 0.0),
        }
    }

    pub fn to_raw(&self) -> BackdropUniform {
        BackdropUniform {
            time: self.time,
            _padding: 0.0,
            resolution: self.resolution.into(),
            mouse: self.mouse.into(),
            _padding2: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackdropUniform {
    time: f32,
    // vec2 members are 8 byte aligned
    _padding: f32,
    resolution: [f32; 2],
    mouse: [f32; 2],
    // uniform blocks are sized in multiples of 16 bytes
    _padding2: [f32; 2],
}

pub const MAX_POINT_LIGHTS: usize = 4;

/// Camera and lights as seen by the scene shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    directional_direction: [f32; 4],
    directional_color: [f32; 4],
    /// xyz: world position, w: range (0 means unlimited).
    point_positions: [[f32; 4]; MAX_POINT_LIGHTS],
    point_colors: [[f32; 4]; MAX_POINT_LIGHTS],
    /// x: number of active point lights.
    counts: [u32; 4],
}

impl SceneUniform {
    /// Collects the camera and every light node of `scene`. Lights beyond
    /// [`MAX_POINT_LIGHTS`] are dropped with a warning.
    pub fn collect(scene: &Scene, camera: &Camera) -> Self {
        let mut uniform = Self {
            view_proj: camera.view_proj().into(),
            camera_position: camera.position.to_homogeneous().into(),
            ambient: [0.0; 4],
            directional_direction: [0.0; 4],
            directional_color: [0.0; 4],
            point_positions: [[0.0; 4]; MAX_POINT_LIGHTS],
            point_colors: [[0.0; 4]; MAX_POINT_LIGHTS],
            counts: [0; 4],
        };
        let mut points = 0usize;
        for (_, node, light) in scene.lights() {
            let position = node.world_position();
            let color = light.color.map(|c| c * light.intensity);
            match light.kind {
                LightKind::Ambient => {
                    for (channel, c) in uniform.ambient.iter_mut().zip(color) {
                        *channel += c;
                    }
                }
                LightKind::Directional => {
                    uniform.directional_direction = [position.x, position.y, position.z, 0.0];
                    uniform.directional_color = [color[0], color[1], color[2], 0.0];
                }
                LightKind::Point { range } => {
                    if points == MAX_POINT_LIGHTS {
                        log::warn!(
                            "scene has more than {} point lights, ignoring the rest",
                            MAX_POINT_LIGHTS
                        );
                        continue;
                    }
                    uniform.point_positions[points] = [position.x, position.y, position.z, range];
                    uniform.point_colors[points] = [color[0], color[1], color[2], 0.0];
                    points += 1;
                }
            }
        }
        uniform.counts[0] = points as u32;
        uniform
    }

    pub fn point_lights(&self) -> usize {
        self.counts[0] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{instance::Instance, scene_graph::Light};

    #[test]
    fn backdrop_uniform_is_32_bytes() {
        assert_eq!(std::mem::size_of::<BackdropUniform>(), 32);
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn collects_point_lights_in_world_space() {
        let mut scene = Scene::new();
        let light = scene.add(
            "key",
            Light::point([1.0, 1.0, 1.0], 1.0, 5.0).into(),
            Instance::at((1.0, 2.0, 3.0)),
        );
        scene.add("fill", Light::ambient([1.0; 3], 0.5).into(), Instance::new());
        scene.update_world_transforms();

        let camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        let uniform = SceneUniform::collect(&scene, &camera);
        assert_eq!(uniform.point_lights(), 1);
        assert_eq!(uniform.point_positions[0], [1.0, 2.0, 3.0, 5.0]);
        assert_eq!(uniform.ambient[0], 0.5);
        assert!(scene.get(light).is_some());
    }
}
