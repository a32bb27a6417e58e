//! Node transforms and the per-draw data uploaded next to each mesh.
//!
//! Every drawable node gets one instance record per frame: its world matrix plus the
//! material colours that are current for the pass being drawn. Keeping the material in
//! the instance stream lets the glow pass swap colours without touching pipelines.

use cgmath::{Euler, Matrix, Matrix3, Matrix4, Quaternion, Rad, SquareMatrix, Vector3};

use crate::data_structures::material::Material;

/// Local transform: position, Euler rotation (XYZ order) and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Identity transform (no move, rotate or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(position: impl Into<Vector3<f32>>) -> Self {
        Self {
            position: position.into(),
            ..Self::new()
        }
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(Quaternion::from(self.rotation))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU layout of one drawn node.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// rgb: emissive colour premultiplied by intensity, w: 1.0 when the surface is lit.
    pub emissive: [f32; 4],
}

impl InstanceRaw {
    pub fn new(world: &Matrix4<f32>, material: &Material) -> Self {
        let normal = world
            .invert()
            .map(|inverse| {
                let m = Matrix3::from_cols(
                    inverse.x.truncate(),
                    inverse.y.truncate(),
                    inverse.z.truncate(),
                )
                .transpose();
                [
                    [m.x.x, m.x.y, m.x.z, 0.0],
                    [m.y.x, m.y.y, m.y.z, 0.0],
                    [m.z.x, m.z.y, m.z.z, 0.0],
                ]
            })
            .unwrap_or([[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]]);
        let (color, emissive, lit) = material.shading();
        Self {
            model: (*world).into(),
            normal,
            color,
            emissive: [emissive[0], emissive[1], emissive[2], if lit { 1.0 } else { 0.0 }],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
            2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4,
            6 => Float32x4, 7 => Float32x4, 8 => Float32x4,
            9 => Float32x4, 10 => Float32x4,
        ];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Each drawn node is a single instance.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}
