//! Headless backend for tests and development.
//!
//! Performs no GPU work. It registers the same kinds of resources a real backend
//! would, records every call into a shared [`HeadlessLog`], and can be told to fail or
//! panic on a chosen pass so error paths can be exercised without hardware.

use std::{cell::RefCell, rc::Rc};

use log::trace;

use super::{PassTarget, RenderBackend};
use crate::{
    camera::Camera,
    config::{BloomSettings, SceneConfig, SurfaceSize},
    data_structures::{material::Material, scene_graph::Scene, uniforms::UniformSet},
    error::SceneError,
    resources::{Disposable, ResourceId, ResourceKind, ResourceSet},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Acquire,
    Resize(SurfaceSize),
    BeginFrame,
    Draw(DrawRecord),
    Composite(BloomSettings),
    EndFrame,
    AbortFrame,
}

/// What one pass saw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub target: PassTarget,
    /// Name and current material of every renderable, in draw order.
    pub materials: Vec<(String, Material)>,
    pub time: f32,
    pub mouse: [f32; 2],
    pub aspect: f32,
}

#[derive(Debug, Default)]
pub struct HeadlessLog {
    pub calls: Vec<Call>,
    /// Labels of released resources, in release order.
    pub released: Vec<String>,
}

impl HeadlessLog {
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.calls.iter().filter_map(|call| match call {
            Call::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    pub fn presented_frames(&self) -> usize {
        self.calls.iter().filter(|call| **call == Call::EndFrame).count()
    }
}

pub type SharedLog = Rc<RefCell<HeadlessLog>>;

struct HeadlessResource {
    kind: ResourceKind,
    label: String,
    log: SharedLog,
}

impl Disposable for HeadlessResource {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn release(self: Box<Self>) {
        self.log.borrow_mut().released.push(self.label);
    }
}

#[derive(Debug)]
pub struct HeadlessBackend {
    log: SharedLog,
    size: SurfaceSize,
    sample_count: u32,
    bloom: bool,
    targets: Vec<ResourceId>,
    in_frame: bool,
    fail_pass: Option<PassTarget>,
    panic_pass: Option<PassTarget>,
    fail_acquire_after: Option<usize>,
    fail_resize: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(HeadlessLog::default())),
            size: SurfaceSize::new(0, 0),
            sample_count: 1,
            bloom: false,
            targets: Vec::new(),
            in_frame: false,
            fail_pass: None,
            panic_pass: None,
            fail_acquire_after: None,
            fail_resize: false,
        }
    }

    /// Handle to the call log; stays valid after the backend moves into a view.
    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }

    /// Every draw into `target` returns an error.
    pub fn failing_on(mut self, target: PassTarget) -> Self {
        self.fail_pass = Some(target);
        self
    }

    /// Every draw into `target` panics.
    pub fn panicking_on(mut self, target: PassTarget) -> Self {
        self.panic_pass = Some(target);
        self
    }

    /// `acquire` registers `count` resources and then fails.
    pub fn failing_acquire_after(mut self, count: usize) -> Self {
        self.fail_acquire_after = Some(count);
        self
    }

    pub fn set_fail_resize(&mut self, fail: bool) {
        self.fail_resize = fail;
    }

    pub fn set_fail_pass(&mut self, target: Option<PassTarget>) {
        self.fail_pass = target;
    }

    fn register(
        &self,
        resources: &mut ResourceSet,
        kind: ResourceKind,
        label: String,
        registered: &mut usize,
    ) -> Result<ResourceId, SceneError> {
        if self.fail_acquire_after == Some(*registered) {
            return Err(SceneError::DeviceUnavailable(format!(
                "headless backend refused '{}'",
                label
            )));
        }
        *registered += 1;
        let resource = HeadlessResource {
            kind,
            label: label.clone(),
            log: self.log.clone(),
        };
        Ok(resources.acquire(label, Box::new(resource)))
    }

    fn create_targets(
        &mut self,
        resources: &mut ResourceSet,
        registered: &mut usize,
    ) -> Result<(), SceneError> {
        let mut labels = vec!["depth texture"];
        if self.sample_count > 1 {
            labels.push("msaa texture");
        }
        if self.bloom {
            labels.extend(["glow target", "base target", "blur target"]);
        }
        for label in labels {
            let id = self.register(resources, ResourceKind::Texture, label.to_string(), registered)?;
            self.targets.push(id);
        }
        Ok(())
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "Headless Backend"
    }

    fn acquire(
        &mut self,
        scene: &Scene,
        config: &SceneConfig,
        resources: &mut ResourceSet,
    ) -> Result<(), SceneError> {
        self.log.borrow_mut().calls.push(Call::Acquire);
        self.size = config.size;
        self.sample_count = config.sample_count();
        self.bloom = config.bloom.is_some();

        let mut registered = 0;
        self.register(resources, ResourceKind::Context, "context".to_string(), &mut registered)?;
        for pipeline in ["mesh pipeline", "points pipeline", "backdrop pipeline"] {
            self.register(resources, ResourceKind::Pipeline, pipeline.to_string(), &mut registered)?;
        }
        if self.bloom {
            for pipeline in ["blur pipeline", "composite pipeline"] {
                self.register(resources, ResourceKind::Pipeline, pipeline.to_string(), &mut registered)?;
            }
        }
        self.register(resources, ResourceKind::Buffer, "scene uniforms".to_string(), &mut registered)?;
        for (id, geometry) in scene.geometries() {
            trace!(
                "HeadlessBackend: geometry {} with {} vertices",
                id.index(),
                geometry.vertex_count()
            );
            self.register(
                resources,
                ResourceKind::Geometry,
                format!("geometry {}", id.index()),
                &mut registered,
            )?;
        }
        for (_, node) in scene.renderables() {
            self.register(
                resources,
                ResourceKind::Material,
                format!("material of {}", node.name),
                &mut registered,
            )?;
        }
        self.create_targets(resources, &mut registered)
    }

    fn resize(&mut self, size: SurfaceSize, resources: &mut ResourceSet) -> Result<(), SceneError> {
        self.log.borrow_mut().calls.push(Call::Resize(size));
        if self.fail_resize {
            return Err(SceneError::Surface(wgpu::SurfaceError::Lost));
        }
        self.size = size;
        for id in self.targets.drain(..) {
            resources.release(id);
        }
        let mut registered = 0;
        self.create_targets(resources, &mut registered)
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn begin_frame(&mut self) -> Result<(), SceneError> {
        self.in_frame = true;
        self.log.borrow_mut().calls.push(Call::BeginFrame);
        Ok(())
    }

    fn draw(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        uniforms: &UniformSet,
        target: PassTarget,
    ) -> Result<(), SceneError> {
        if !self.in_frame {
            return Err(SceneError::NoFrame("draw"));
        }
        let materials = scene
            .renderables()
            .filter_map(|(_, node)| node.material().map(|m| (node.name.clone(), *m)))
            .collect();
        self.log.borrow_mut().calls.push(Call::Draw(DrawRecord {
            target,
            materials,
            time: uniforms.time,
            mouse: uniforms.mouse.into(),
            aspect: camera.aspect(),
        }));
        if self.panic_pass == Some(target) {
            panic!("headless backend told to panic on the {:?} pass", target);
        }
        if self.fail_pass == Some(target) {
            return Err(SceneError::Pass(target, "injected failure".to_string()));
        }
        Ok(())
    }

    fn composite(&mut self, settings: &BloomSettings) -> Result<(), SceneError> {
        if !self.in_frame {
            return Err(SceneError::NoFrame("composite"));
        }
        self.log.borrow_mut().calls.push(Call::Composite(*settings));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), SceneError> {
        if !std::mem::take(&mut self.in_frame) {
            return Err(SceneError::NoFrame("end_frame"));
        }
        self.log.borrow_mut().calls.push(Call::EndFrame);
        Ok(())
    }

    fn abort_frame(&mut self) {
        if std::mem::take(&mut self.in_frame) {
            self.log.borrow_mut().calls.push(Call::AbortFrame);
        }
    }
}
