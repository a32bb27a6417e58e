//! WGPU backend.
//!
//! Scene passes render into a multisampled colour target when antialiasing is on and
//! resolve into the surface (plain frames) or into offscreen HDR targets (bloom frames).
//! Per-node data lives in one small instance buffer per renderable, rewritten before
//! every pass. Each pass is submitted on its own so that the glow pass and the base pass
//! see the materials that were current when they were recorded.

use std::collections::HashMap;

use bytemuck::Zeroable;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use super::{PassTarget, RenderBackend};
use crate::{
    bloom::{BlurUniform, CompositeUniform},
    camera::Camera,
    config::{BloomSettings, SceneConfig, SurfaceSize},
    context::Context,
    data_structures::{
        geometry::Topology,
        instance::InstanceRaw,
        scene_graph::{NodeId, Scene},
        texture::{self, Texture},
        uniforms::{SceneUniform, UniformSet},
    },
    error::SceneError,
    pipelines::{
        basic::{TargetFormat, mk_uniform_bind_group, mk_uniform_layout},
        post, scene as scene_pipelines,
    },
    resources::{ResourceId, ResourceSet, gpu::GpuResource},
};

struct GpuGeometry {
    vertex: wgpu::Buffer,
    index: Option<wgpu::Buffer>,
    count: u32,
    topology: Topology,
}

struct ScenePipelines {
    mesh: wgpu::RenderPipeline,
    points: wgpu::RenderPipeline,
    backdrop: wgpu::RenderPipeline,
}

struct BloomPipelines {
    blur_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    horizontal: wgpu::Buffer,
    vertical: wgpu::Buffer,
    strength: wgpu::Buffer,
}

/// Offscreen images of the bloom path and the bind groups reading them.
struct BloomTargets {
    glow: Texture,
    base: Texture,
    ping: Texture,
    pong: Texture,
    /// glow -> ping (horizontal), ping -> pong (vertical), pong -> ping (horizontal)
    blur_groups: [wgpu::BindGroup; 3],
    composite_group: wgpu::BindGroup,
}

struct Targets {
    depth: Texture,
    msaa: Option<Texture>,
    bloom: Option<BloomTargets>,
    ids: Vec<ResourceId>,
}

/// Everything created by `acquire`.
struct Mounted {
    scene_format: wgpu::TextureFormat,
    pipelines: ScenePipelines,
    bloom: Option<BloomPipelines>,
    scene_buffer: wgpu::Buffer,
    scene_group: wgpu::BindGroup,
    backdrop_buffer: wgpu::Buffer,
    backdrop_group: wgpu::BindGroup,
    geometries: Vec<GpuGeometry>,
    instances: HashMap<NodeId, wgpu::Buffer>,
    targets: Targets,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

pub struct GpuBackend {
    ctx: Context,
    sample_count: u32,
    mounted: Option<Mounted>,
    frame: Option<Frame>,
}

impl GpuBackend {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            sample_count: 1,
            mounted: None,
            frame: None,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn create_targets(
        ctx: &Context,
        size: SurfaceSize,
        scene_format: wgpu::TextureFormat,
        sample_count: u32,
        bloom: Option<&BloomPipelines>,
        resources: &mut ResourceSet,
    ) -> Targets {
        let device = &ctx.device;
        let mut ids = Vec::new();

        let depth = Texture::create_depth_texture(device, size, sample_count, "depth_texture");
        ids.push(resources.acquire("depth texture", GpuResource::Texture(depth.texture.clone()).boxed()));

        let mut msaa = None;
        if sample_count > 1 {
            let texture = Texture::create_msaa_texture(device, size, scene_format, sample_count, "msaa_texture");
            ids.push(resources.acquire("msaa texture", GpuResource::Texture(texture.texture.clone()).boxed()));
            msaa = Some(texture);
        }

        let mut bloom_targets = None;
        if let Some(bloom) = bloom {
            // the blur runs at half resolution
            let half = SurfaceSize::new((size.width / 2).max(1), (size.height / 2).max(1));
            let glow = Texture::create_render_target(device, size, Texture::HDR_FORMAT, "glow_target");
            let base = Texture::create_render_target(device, size, Texture::HDR_FORMAT, "base_target");
            let ping = Texture::create_render_target(device, half, Texture::HDR_FORMAT, "blur_ping");
            let pong = Texture::create_render_target(device, half, Texture::HDR_FORMAT, "blur_pong");
            for (texture, label) in [
                (&glow, "glow target"),
                (&base, "base target"),
                (&ping, "blur ping"),
                (&pong, "blur pong"),
            ] {
                ids.push(resources.acquire(label, GpuResource::Texture(texture.texture.clone()).boxed()));
            }
            let blur_groups = [
                post::mk_blur_bind_group(device, &bloom.blur_layout, &glow, &bloom.sampler, &bloom.horizontal),
                post::mk_blur_bind_group(device, &bloom.blur_layout, &ping, &bloom.sampler, &bloom.vertical),
                post::mk_blur_bind_group(device, &bloom.blur_layout, &pong, &bloom.sampler, &bloom.horizontal),
            ];
            let composite_group = post::mk_composite_bind_group(
                device,
                &bloom.composite_layout,
                &base,
                &pong,
                &bloom.sampler,
                &bloom.strength,
            );
            bloom_targets = Some(BloomTargets {
                glow,
                base,
                ping,
                pong,
                blur_groups,
                composite_group,
            });
        }

        Targets {
            depth,
            msaa,
            bloom: bloom_targets,
            ids,
        }
    }

    fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, contents: &T) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(std::slice::from_ref(contents)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }
}

fn color_attachment<'a>(
    view: &'a wgpu::TextureView,
    resolve_target: Option<&'a wgpu::TextureView>,
    clear: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'a>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear),
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "WGPU Backend"
    }

    fn acquire(
        &mut self,
        scene: &Scene,
        config: &SceneConfig,
        resources: &mut ResourceSet,
    ) -> Result<(), SceneError> {
        self.ctx.configure(config.size);
        self.sample_count = config.sample_count();
        let ctx = &self.ctx;
        let device = &ctx.device;
        resources.acquire("device", GpuResource::Device(device.clone()).boxed());

        let scene_format = if config.bloom.is_some() {
            Texture::HDR_FORMAT
        } else {
            ctx.config.format
        };
        let target = TargetFormat::scene(scene_format, self.sample_count);

        let scene_layout = mk_uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            "scene_bind_group_layout",
        );
        let backdrop_layout = mk_uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "backdrop_bind_group_layout");

        let pipelines = ScenePipelines {
            mesh: scene_pipelines::mk_mesh_pipeline(device, target, &scene_layout),
            points: scene_pipelines::mk_points_pipeline(device, target, &scene_layout),
            backdrop: scene_pipelines::mk_backdrop_pipeline(device, target, &backdrop_layout),
        };
        for (pipeline, label) in [
            (&pipelines.mesh, "mesh pipeline"),
            (&pipelines.points, "points pipeline"),
            (&pipelines.backdrop, "backdrop pipeline"),
        ] {
            resources.acquire(label, GpuResource::Pipeline(pipeline.clone()).boxed());
        }

        let scene_buffer = Self::uniform_buffer(device, "Scene Buffer", &SceneUniform::zeroed());
        let backdrop_buffer = Self::uniform_buffer(device, "Backdrop Buffer", &UniformSet::new(config.size).to_raw());
        resources.acquire("scene uniforms", GpuResource::Buffer(scene_buffer.clone()).boxed());
        resources.acquire("backdrop uniforms", GpuResource::Buffer(backdrop_buffer.clone()).boxed());
        let scene_group = mk_uniform_bind_group(device, &scene_layout, &scene_buffer, "scene_bind_group");
        let backdrop_group = mk_uniform_bind_group(device, &backdrop_layout, &backdrop_buffer, "backdrop_bind_group");

        let mut geometries = Vec::new();
        for (id, geometry) in scene.geometries() {
            let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Vertex Buffer {}", id.index())),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            resources.acquire(format!("vertices {}", id.index()), GpuResource::GeometryBuffer(vertex.clone()).boxed());
            let index = geometry.is_indexed().then(|| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Index Buffer {}", id.index())),
                    contents: bytemuck::cast_slice(&geometry.indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
            });
            if let Some(index) = &index {
                resources.acquire(format!("indices {}", id.index()), GpuResource::GeometryBuffer(index.clone()).boxed());
            }
            let count = if geometry.is_indexed() {
                geometry.index_count()
            } else {
                geometry.vertex_count()
            };
            geometries.push(GpuGeometry {
                vertex,
                index,
                count: count as u32,
                topology: geometry.topology,
            });
        }

        let mut instances = HashMap::new();
        for (id, node) in scene.renderables() {
            let Some(material) = node.material() else {
                continue;
            };
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Instance Buffer {}", node.name)),
                contents: bytemuck::cast_slice(&[InstanceRaw::new(node.world(), material)]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
            resources.acquire(format!("material of {}", node.name), GpuResource::MaterialBuffer(buffer.clone()).boxed());
            instances.insert(id, buffer);
        }

        let bloom = config.bloom.as_ref().map(|settings| {
            let blur_layout = post::mk_blur_layout(device);
            let composite_layout = post::mk_composite_layout(device);
            let blur = post::mk_blur_pipeline(device, &blur_layout);
            let composite = post::mk_composite_pipeline(device, &composite_layout, ctx.config.format);
            resources.acquire("blur pipeline", GpuResource::Pipeline(blur.clone()).boxed());
            resources.acquire("composite pipeline", GpuResource::Pipeline(composite.clone()).boxed());

            let texel = [2.0 / ctx.config.width as f32, 2.0 / ctx.config.height as f32];
            let horizontal = Self::uniform_buffer(device, "Blur H Buffer", &BlurUniform::new(true, texel, settings.radius));
            let vertical = Self::uniform_buffer(device, "Blur V Buffer", &BlurUniform::new(false, texel, settings.radius));
            let strength = Self::uniform_buffer(device, "Composite Buffer", &CompositeUniform::new(settings));
            for (buffer, label) in [
                (&horizontal, "blur uniforms h"),
                (&vertical, "blur uniforms v"),
                (&strength, "composite uniforms"),
            ] {
                resources.acquire(label, GpuResource::Buffer(buffer.clone()).boxed());
            }
            BloomPipelines {
                blur_layout,
                composite_layout,
                blur,
                composite,
                sampler: texture::create_clamped_sampler(device),
                horizontal,
                vertical,
                strength,
            }
        });

        let targets = Self::create_targets(
            ctx,
            ctx.size(),
            scene_format,
            self.sample_count,
            bloom.as_ref(),
            resources,
        );
        debug!(
            "GPU resources ready: {} geometries, {} instance buffers, {} live resources",
            geometries.len(),
            instances.len(),
            resources.live()
        );

        self.mounted = Some(Mounted {
            scene_format,
            pipelines,
            bloom,
            scene_buffer,
            scene_group,
            backdrop_buffer,
            backdrop_group,
            geometries,
            instances,
            targets,
        });
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize, resources: &mut ResourceSet) -> Result<(), SceneError> {
        self.ctx.configure(size);
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        for id in mounted.targets.ids.drain(..) {
            resources.release(id);
        }
        mounted.targets = Self::create_targets(
            &self.ctx,
            size,
            mounted.scene_format,
            self.sample_count,
            mounted.bloom.as_ref(),
            resources,
        );
        Ok(())
    }

    fn size(&self) -> SurfaceSize {
        self.ctx.size()
    }

    fn begin_frame(&mut self) -> Result<(), SceneError> {
        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                self.ctx.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame { output, view });
        Ok(())
    }

    fn draw(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        uniforms: &UniformSet,
        target: PassTarget,
    ) -> Result<(), SceneError> {
        let frame = self.frame.as_ref().ok_or(SceneError::NoFrame("draw"))?;
        let mounted = self
            .mounted
            .as_ref()
            .ok_or_else(|| SceneError::Pass(target, "backend has no mounted scene".to_string()))?;

        let resolved = match target {
            PassTarget::Surface => &frame.view,
            PassTarget::Glow | PassTarget::Base => {
                let bloom = mounted
                    .targets
                    .bloom
                    .as_ref()
                    .ok_or_else(|| SceneError::Pass(target, "bloom is not enabled".to_string()))?;
                if target == PassTarget::Glow {
                    &bloom.glow.view
                } else {
                    &bloom.base.view
                }
            }
        };
        let (view, resolve_target) = match &mounted.targets.msaa {
            Some(msaa) => (&msaa.view, Some(resolved)),
            None => (resolved, None),
        };
        let clear = if target == PassTarget::Glow {
            wgpu::Color::BLACK
        } else {
            let [r, g, b] = scene.background;
            wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            }
        };

        let queue = &self.ctx.queue;
        queue.write_buffer(
            &mounted.scene_buffer,
            0,
            bytemuck::cast_slice(&[SceneUniform::collect(scene, camera)]),
        );
        queue.write_buffer(&mounted.backdrop_buffer, 0, bytemuck::cast_slice(&[uniforms.to_raw()]));
        for (id, node) in scene.renderables() {
            if let (Some(buffer), Some(material)) = (mounted.instances.get(&id), node.material()) {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[InstanceRaw::new(node.world(), material)]));
            }
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[color_attachment(view, resolve_target, clear)],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &mounted.targets.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for (id, node) in scene.renderables() {
                let (Some(geometry), Some(material), Some(instance)) = (
                    node.geometry().and_then(|g| mounted.geometries.get(g.index())),
                    node.material(),
                    mounted.instances.get(&id),
                ) else {
                    warn!("node '{}' has no GPU data, skipping it", node.name);
                    continue;
                };
                if material.is_backdrop() {
                    render_pass.set_pipeline(&mounted.pipelines.backdrop);
                    render_pass.set_bind_group(0, &mounted.backdrop_group, &[]);
                } else {
                    let pipeline = match geometry.topology {
                        Topology::Points => &mounted.pipelines.points,
                        Topology::Triangles => &mounted.pipelines.mesh,
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, &mounted.scene_group, &[]);
                    render_pass.set_vertex_buffer(1, instance.slice(..));
                }
                render_pass.set_vertex_buffer(0, geometry.vertex.slice(..));
                match &geometry.index {
                    Some(index) => {
                        render_pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..geometry.count, 0, 0..1);
                    }
                    None => render_pass.draw(0..geometry.count, 0..1),
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn composite(&mut self, settings: &BloomSettings) -> Result<(), SceneError> {
        let frame = self.frame.as_ref().ok_or(SceneError::NoFrame("composite"))?;
        let Some(mounted) = self.mounted.as_ref() else {
            return Err(SceneError::Pass(PassTarget::Surface, "backend has no mounted scene".to_string()));
        };
        let (Some(bloom), Some(targets)) = (mounted.bloom.as_ref(), mounted.targets.bloom.as_ref()) else {
            return Err(SceneError::Pass(PassTarget::Surface, "bloom is not enabled".to_string()));
        };

        let queue = &self.ctx.queue;
        let size = targets.ping.texture.size();
        let texel = [1.0 / size.width as f32, 1.0 / size.height as f32];
        queue.write_buffer(&bloom.horizontal, 0, bytemuck::cast_slice(&[BlurUniform::new(true, texel, settings.radius)]));
        queue.write_buffer(&bloom.vertical, 0, bytemuck::cast_slice(&[BlurUniform::new(false, texel, settings.radius)]));
        queue.write_buffer(&bloom.strength, 0, bytemuck::cast_slice(&[CompositeUniform::new(settings)]));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bloom Encoder"),
            });
        for round in 0..settings.iterations {
            let horizontal_source = if round == 0 { 0 } else { 2 };
            for (group, output) in [
                (&targets.blur_groups[horizontal_source], &targets.ping),
                (&targets.blur_groups[1], &targets.pong),
            ] {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Blur Pass"),
                    color_attachments: &[color_attachment(&output.view, None, wgpu::Color::BLACK)],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                pass.set_pipeline(&bloom.blur);
                pass.set_bind_group(0, group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[color_attachment(&frame.view, None, wgpu::Color::BLACK)],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&bloom.composite);
            pass.set_bind_group(0, &targets.composite_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), SceneError> {
        let frame = self.frame.take().ok_or(SceneError::NoFrame("end_frame"))?;
        self.ctx.window.pre_present_notify();
        frame.output.present();
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.frame = None;
    }
}
