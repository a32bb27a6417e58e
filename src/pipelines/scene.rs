use crate::{
    data_structures::{geometry::Vertex, instance::InstanceRaw},
    pipelines::basic::{TargetFormat, mk_render_pipeline},
};

fn scene_shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
    }
}

fn scene_layout(device: &wgpu::Device, scene_layout: &wgpu::BindGroupLayout) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[scene_layout],
        push_constant_ranges: &[],
    })
}

/// Lit and flat triangle meshes.
pub fn mk_mesh_pipeline(
    device: &wgpu::Device,
    target: TargetFormat,
    scene_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        "Mesh Pipeline",
        &scene_layout(device, scene_bind_group_layout),
        target,
        Some(wgpu::BlendState::REPLACE),
        wgpu::PrimitiveTopology::TriangleList,
        &[Vertex::desc(), InstanceRaw::desc()],
        scene_shader(),
    )
}

/// Point clouds. Points are always one pixel; the material's size is not honoured.
pub fn mk_points_pipeline(
    device: &wgpu::Device,
    target: TargetFormat,
    scene_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        "Points Pipeline",
        &scene_layout(device, scene_bind_group_layout),
        target,
        Some(wgpu::BlendState::REPLACE),
        wgpu::PrimitiveTopology::PointList,
        &[Vertex::desc(), InstanceRaw::desc()],
        scene_shader(),
    )
}

pub fn mk_backdrop_pipeline(
    device: &wgpu::Device,
    target: TargetFormat,
    backdrop_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Backdrop Pipeline Layout"),
        bind_group_layouts: &[backdrop_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Backdrop Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Backdrop Pipeline",
        &layout,
        target,
        Some(wgpu::BlendState::REPLACE),
        wgpu::PrimitiveTopology::TriangleList,
        &[Vertex::desc()],
        shader,
    )
}
