//! Per-frame animation drivers.
//!
//! An [`Animator`] mutates node transforms and uniforms from the frame time. Most drivers
//! are stateless: their output is a pure function of `time.elapsed`, so two frames with the
//! same elapsed time leave the scene in the same state. [`IncrementalSpinDriver`] is the
//! exception and integrates `time.delta` instead.

use cgmath::{Rad, Vector3};
use log::trace;

use crate::{
    clock::FrameTime,
    data_structures::{scene_graph::{NodeId, Scene}, uniforms::UniformSet},
};

pub trait Animator {
    fn update(&mut self, scene: &mut Scene, uniforms: &mut UniformSet, time: FrameTime);
}

/// Turns the helix group and makes every icon spin and bob with its own phase.
#[derive(Debug, Clone)]
pub struct HelixDriver {
    pub group: NodeId,
    pub icons: Vec<NodeId>,
}

impl HelixDriver {
    pub const GROUP_SPEED: f32 = 0.5;
    pub const ICON_SPIN: f32 = 2.0;
    pub const PHASE_STEP: f32 = 0.5;
    pub const BOB_AMPLITUDE: f32 = 0.1;

    pub fn new(group: NodeId, icons: Vec<NodeId>) -> Self {
        Self { group, icons }
    }
}

impl Animator for HelixDriver {
    fn update(&mut self, scene: &mut Scene, _uniforms: &mut UniformSet, time: FrameTime) {
        let t = time.elapsed;
        if let Some(group) = scene.get_mut(self.group) {
            group.local.rotation.y = Rad(t * Self::GROUP_SPEED);
        }
        for (i, icon) in self.icons.iter().enumerate() {
            let phase = i as f32 * Self::PHASE_STEP;
            if let Some(icon) = scene.get_mut(*icon) {
                icon.local.rotation.z = Rad(t * Self::ICON_SPIN + phase);
                icon.local.position.y = (t + phase).sin() * Self::BOB_AMPLITUDE;
            }
        }
    }
}

/// Absolute rotation about the y axis: `rotation.y = speed * t`.
#[derive(Debug, Clone)]
pub struct SpinDriver {
    pub node: NodeId,
    pub speed: f32,
}

impl SpinDriver {
    pub fn new(node: NodeId, speed: f32) -> Self {
        Self { node, speed }
    }
}

impl Animator for SpinDriver {
    fn update(&mut self, scene: &mut Scene, _uniforms: &mut UniformSet, time: FrameTime) {
        if let Some(node) = scene.get_mut(self.node) {
            node.local.rotation.y = Rad(time.elapsed * self.speed);
        }
    }
}

/// Moves three lights along Lissajous-like paths on a sphere-ish shell of `radius`.
#[derive(Debug, Clone)]
pub struct OrbitingLightsDriver {
    pub lights: [NodeId; 3],
    pub radius: f32,
}

impl OrbitingLightsDriver {
    pub fn new(lights: [NodeId; 3]) -> Self {
        Self { lights, radius: 1.5 }
    }

    /// Positions of the three lights at `t`.
    pub fn positions(&self, t: f32) -> [Vector3<f32>; 3] {
        let r = self.radius;
        [
            Vector3::new((t * 0.7).sin(), (t * 0.5).cos(), (t * 0.3).cos()) * r,
            Vector3::new((t * 0.3).cos(), (t * 0.5).sin(), (t * 0.7).sin()) * r,
            Vector3::new((t * 0.7).sin(), (t * 0.3).cos(), (t * 0.5).sin()) * r,
        ]
    }
}

impl Animator for OrbitingLightsDriver {
    fn update(&mut self, scene: &mut Scene, _uniforms: &mut UniformSet, time: FrameTime) {
        let positions = self.positions(time.elapsed);
        for (light, position) in self.lights.iter().zip(positions) {
            if let Some(light) = scene.get_mut(*light) {
                light.local.position = position;
            }
        }
    }
}

/// Writes the elapsed time into the `time` uniform.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockUniformDriver;

impl Animator for ClockUniformDriver {
    fn update(&mut self, _scene: &mut Scene, uniforms: &mut UniformSet, time: FrameTime) {
        uniforms.time = time.elapsed;
    }
}

/// Accumulates a constant rate on top of the previous frame's rotation, so
/// `rotation(t + d) = rotation(t) + rate * d`.
#[derive(Debug, Clone)]
pub struct IncrementalSpinDriver {
    pub node: NodeId,
    /// Radians per second about x and y.
    pub rate: (f32, f32),
}

impl IncrementalSpinDriver {
    pub fn new(node: NodeId, rate: (f32, f32)) -> Self {
        Self { node, rate }
    }
}

impl Animator for IncrementalSpinDriver {
    fn update(&mut self, scene: &mut Scene, _uniforms: &mut UniformSet, time: FrameTime) {
        if let Some(node) = scene.get_mut(self.node) {
            node.local.rotation.x += Rad(self.rate.0 * time.delta);
            node.local.rotation.y += Rad(self.rate.1 * time.delta);
        }
    }
}

/// Runs several drivers in insertion order.
#[derive(Default)]
pub struct Animators {
    drivers: Vec<Box<dyn Animator>>,
}

impl Animators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, driver: impl Animator + 'static) -> Self {
        self.drivers.push(Box::new(driver));
        self
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Animator for Animators {
    fn update(&mut self, scene: &mut Scene, uniforms: &mut UniformSet, time: FrameTime) {
        trace!("animating {} drivers at t={:.3}", self.drivers.len(), time.elapsed);
        for driver in &mut self.drivers {
            driver.update(scene, uniforms, time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SurfaceSize,
        data_structures::{instance::Instance, scene_graph::NodeKind},
    };

    fn at(elapsed: f32) -> FrameTime {
        FrameTime { elapsed, delta: 0.0 }
    }

    fn helix_scene() -> (Scene, HelixDriver) {
        let mut scene = Scene::new();
        let group = scene.add("helix", NodeKind::Group, Instance::new());
        let icons = (0..4)
            .map(|i| scene.add_child(group, format!("float {i}"), NodeKind::Group, Instance::new()))
            .collect();
        (scene, HelixDriver::new(group, icons))
    }

    #[test]
    fn helix_icon_phase() {
        let (mut scene, mut driver) = helix_scene();
        let mut uniforms = UniformSet::new(SurfaceSize::new(800, 600));
        driver.update(&mut scene, &mut uniforms, at(3.0));

        let icon = scene.get(driver.icons[2]).unwrap();
        assert!((icon.local.rotation.z.0 - 7.0).abs() < 1e-6);
        assert!((icon.local.position.y - 0.1 * 4.0f32.sin()).abs() < 1e-6);
        let group = scene.get(driver.group).unwrap();
        assert!((group.local.rotation.y.0 - 1.5).abs() < 1e-6);
    }

    #[test]
    fn stateless_drivers_repeat_for_same_time() {
        let (mut scene, mut driver) = helix_scene();
        let mut uniforms = UniformSet::new(SurfaceSize::new(800, 600));
        driver.update(&mut scene, &mut uniforms, at(1.25));
        let first: Vec<Instance> = driver
            .icons
            .iter()
            .map(|id| scene.get(*id).unwrap().local.clone())
            .collect();

        driver.update(&mut scene, &mut uniforms, at(9.0));
        driver.update(&mut scene, &mut uniforms, at(1.25));
        let second: Vec<Instance> = driver
            .icons
            .iter()
            .map(|id| scene.get(*id).unwrap().local.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn orbiting_lights_stay_on_their_shell() {
        let mut scene = Scene::new();
        let lights = [0, 1, 2].map(|i| scene.add(format!("light {i}"), NodeKind::Group, Instance::new()));
        let mut driver = OrbitingLightsDriver::new(lights);
        let mut uniforms = UniformSet::new(SurfaceSize::new(800, 600));
        driver.update(&mut scene, &mut uniforms, at(0.0));

        let first = scene.get(lights[0]).unwrap().local.position;
        assert_eq!(first, Vector3::new(0.0, 1.5, 1.5));
        for position in driver.positions(12.3) {
            assert!(position.x.abs() <= 1.5 && position.y.abs() <= 1.5 && position.z.abs() <= 1.5);
        }
    }

    #[test]
    fn incremental_spin_is_linear_in_delta() {
        let mut scene = Scene::new();
        let cube = scene.add("cube", NodeKind::Group, Instance::new());
        let mut driver = IncrementalSpinDriver::new(cube, (0.01 * 60.0, 0.01 * 60.0));
        let mut uniforms = UniformSet::new(SurfaceSize::new(800, 600));

        for _ in 0..3 {
            driver.update(&mut scene, &mut uniforms, FrameTime { elapsed: 0.0, delta: 0.5 });
        }
        let rotation = scene.get(cube).unwrap().local.rotation;
        assert!((rotation.x.0 - 0.9).abs() < 1e-5);
        assert!((rotation.y.0 - 0.9).abs() < 1e-5);
    }

    #[test]
    fn composed_drivers_run_in_order() {
        let (mut scene, helix) = helix_scene();
        let mut animators = Animators::new()
            .with(helix)
            .with(ClockUniformDriver);
        let mut uniforms = UniformSet::new(SurfaceSize::new(800, 600));
        animators.update(&mut scene, &mut uniforms, at(2.5));
        assert_eq!(animators.len(), 2);
        assert_eq!(uniforms.time, 2.5);
    }
}
