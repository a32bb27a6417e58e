//! Geometry builders.
//!
//! Pure functions from parameters to CPU-side vertex/index data. Nothing here touches
//! the GPU; the backend uploads a [`Geometry`] once when a view mounts.

use cgmath::{InnerSpace, Quaternion, Rad, Rotation, Rotation3, Vector3};
use rand::Rng;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Points,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    /// Empty for point clouds, which are drawn unindexed.
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }
}

/// Axis-aligned box centred on the origin, four vertices per face for sharp normals.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Geometry {
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
    let x = Vector3::unit_x();
    let y = Vector3::unit_y();
    let z = Vector3::unit_z();
    // (normal, u, v) with u x v = normal so every face winds counter-clockwise
    let faces = [(x, y, z), (-x, z, y), (y, z, x), (-y, x, z), (z, x, y), (-z, y, x)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = mul(normal, half) + mul(u, half) * su + mul(v, half) * sv;
            vertices.push(Vertex {
                position: p.into(),
                normal: normal.into(),
            });
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Geometry {
        vertices,
        indices,
        topology: Topology::Triangles,
    }
}

fn mul(a: Vector3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(a.x * b.x, a.y * b.y, a.z * b.z)
}

/// Cone centred on the origin with its apex on +y. Three radial segments give the
/// triangular "play icon" pyramid of the helix.
pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Geometry {
    let segments = radial_segments.max(3);
    let apex = Vector3::new(0.0, height / 2.0, 0.0);
    let ring = |i: u32| {
        let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
        Vector3::new(radius * theta.sin(), -height / 2.0, radius * theta.cos())
    };

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut triangle = |a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>| {
        let normal = (b - a).cross(c - a).normalize();
        let base = vertices.len() as u32;
        for p in [a, b, c] {
            vertices.push(Vertex {
                position: p.into(),
                normal: normal.into(),
            });
        }
        indices.extend([base, base + 1, base + 2]);
    };
    let center = Vector3::new(0.0, -height / 2.0, 0.0);
    for i in 0..segments {
        let (p0, p1) = (ring(i), ring(i + 1));
        triangle(p0, p1, apex);
        triangle(center, p1, p0);
    }
    Geometry {
        vertices,
        indices,
        topology: Topology::Triangles,
    }
}

pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    for iy in 0..=hs {
        let theta = iy as f32 / hs as f32 * std::f32::consts::PI;
        for ix in 0..=ws {
            let phi = ix as f32 / ws as f32 * std::f32::consts::TAU;
            let normal = Vector3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: (normal * radius).into(),
                normal: normal.into(),
            });
        }
    }
    let at = |ix: u32, iy: u32| iy * (ws + 1) + ix;
    let mut indices = Vec::new();
    for iy in 0..hs {
        for ix in 0..ws {
            let a = at(ix + 1, iy);
            let b = at(ix, iy);
            let c = at(ix, iy + 1);
            let d = at(ix + 1, iy + 1);
            // The pole rows collapse to single triangles.
            if iy != 0 {
                indices.extend([a, b, d]);
            }
            if iy != hs - 1 {
                indices.extend([b, c, d]);
            }
        }
    }
    Geometry {
        vertices,
        indices,
        topology: Topology::Triangles,
    }
}

/// Quad in the xy plane facing +z. `plane(2.0, 2.0)` covers clip space.
pub fn plane(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertices = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
        .into_iter()
        .map(|(x, y)| Vertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
        })
        .collect();
    Geometry {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
        topology: Topology::Triangles,
    }
}

pub fn point_cloud(positions: Vec<[f32; 3]>) -> Geometry {
    Geometry {
        vertices: positions
            .into_iter()
            .map(|position| Vertex {
                position,
                normal: [0.0; 3],
            })
            .collect(),
        indices: Vec::new(),
        topology: Topology::Points,
    }
}

/// Points on a helix around the y axis, centred vertically on the origin.
pub fn helix_points(count: usize, turns: f32, radius: f32, rise: f32) -> Vec<Vector3<f32>> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU * turns;
            Vector3::new(
                angle.cos() * radius,
                (i as f32 - (count / 2) as f32) * rise,
                angle.sin() * radius,
            )
        })
        .collect()
}

/// Uniform random placement inside a cube of side `extent` centred on the origin.
/// Only called while building a scene, never per frame.
pub fn scatter<R: Rng + ?Sized>(count: usize, extent: f32, rng: &mut R) -> Vec<[f32; 3]> {
    (0..count)
        .map(|_| {
            [
                (rng.r#gen::<f32>() - 0.5) * extent,
                (rng.r#gen::<f32>() - 0.5) * extent,
                (rng.r#gen::<f32>() - 0.5) * extent,
            ]
        })
        .collect()
}

/// Uniform Catmull-Rom spline through a list of control points.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRomCurve {
    points: Vec<Vector3<f32>>,
}

impl CatmullRomCurve {
    pub fn new(points: Vec<Vector3<f32>>) -> Self {
        Self { points }
    }

    /// Position at `u` in [0, 1]; the curve passes through every control point.
    pub fn point_at(&self, u: f32) -> Vector3<f32> {
        let n = self.points.len();
        match n {
            0 => return Vector3::new(0.0, 0.0, 0.0),
            1 => return self.points[0],
            _ => {}
        }
        let segments = (n - 1) as f32;
        let p = u.clamp(0.0, 1.0) * segments;
        let i = (p.floor() as usize).min(n - 2);
        let t = p - i as f32;

        let p1 = self.points[i];
        let p2 = self.points[i + 1];
        // Missing neighbours at the ends are mirrored.
        let p0 = if i > 0 { self.points[i - 1] } else { p1 * 2.0 - p2 };
        let p3 = if i + 2 < n {
            self.points[i + 2]
        } else {
            p2 * 2.0 - p1
        };

        let t2 = t * t;
        let t3 = t2 * t;
        (p1 * 2.0
            + (p2 - p0) * t
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
            + (-p0 + p1 * 3.0 - p2 * 3.0 + p3) * t3)
            * 0.5
    }

    fn tangent_at(&self, u: f32) -> Vector3<f32> {
        let delta = 1e-4;
        let a = self.point_at((u - delta).max(0.0));
        let b = self.point_at((u + delta).min(1.0));
        let tangent = b - a;
        if tangent.magnitude2() > 0.0 {
            tangent.normalize()
        } else {
            Vector3::unit_y()
        }
    }
}

/// Tube swept along `curve` using parallel-transported frames.
pub fn tube(
    curve: &CatmullRomCurve,
    tubular_segments: u32,
    radius: f32,
    radial_segments: u32,
    closed: bool,
) -> Geometry {
    let tubular = tubular_segments.max(1);
    let radial = radial_segments.max(3);

    let tangents: Vec<Vector3<f32>> = (0..=tubular)
        .map(|i| curve.tangent_at(i as f32 / tubular as f32))
        .collect();

    // Initial normal: the axis least aligned with the first tangent.
    let t0 = tangents[0];
    let axis = if t0.x.abs() <= t0.y.abs() && t0.x.abs() <= t0.z.abs() {
        Vector3::unit_x()
    } else if t0.y.abs() <= t0.z.abs() {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    };
    let side = t0.cross(axis).normalize();
    let mut normals = vec![t0.cross(side)];
    for i in 1..tangents.len() {
        let mut normal = normals[i - 1];
        let turn = tangents[i - 1].cross(tangents[i]);
        if turn.magnitude() > f32::EPSILON {
            let angle = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
            normal = Quaternion::from_axis_angle(turn.normalize(), Rad(angle)).rotate_vector(normal);
        }
        normals.push(normal);
    }

    let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);
    for i in 0..=tubular {
        let segment = if closed && i == tubular { 0 } else { i };
        let center = curve.point_at(segment as f32 / tubular as f32);
        let n = normals[segment as usize];
        let b = tangents[segment as usize].cross(n);
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * std::f32::consts::TAU;
            let normal = (n * -v.cos() + b * v.sin()).normalize();
            vertices.push(Vertex {
                position: (center + normal * radius).into(),
                normal: normal.into(),
            });
        }
    }

    let mut indices = Vec::with_capacity((tubular * radial * 6) as usize);
    for j in 1..=tubular {
        for i in 1..=radial {
            let a = (radial + 1) * (j - 1) + (i - 1);
            let b = (radial + 1) * j + (i - 1);
            let c = (radial + 1) * j + i;
            let d = (radial + 1) * (j - 1) + i;
            indices.extend([a, b, d, b, c, d]);
        }
    }
    Geometry {
        vertices,
        indices,
        topology: Topology::Triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn unit_normals(geometry: &Geometry) -> bool {
        geometry
            .vertices
            .iter()
            .all(|v| (Vector3::from(v.normal).magnitude() - 1.0).abs() < 1e-4)
    }

    #[test]
    fn cuboid_has_four_vertices_per_face() {
        let cube = cuboid(1.0, 2.0, 3.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(unit_normals(&cube));
        let max_y = cube.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 1.0);
    }

    #[test]
    fn cuboid_faces_wind_outwards() {
        let cube = cuboid(1.0, 1.0, 1.0);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(cube.vertices[i as usize].position));
            let face = (b - a).cross(c - a);
            let normal = Vector3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face.dot(normal) > 0.0);
        }
    }

    #[test]
    fn three_sided_cone_is_a_pyramid() {
        let cone = cone(0.1, 0.2, 3);
        // three side triangles and three cap triangles
        assert_eq!(cone.index_count(), 18);
        assert!(unit_normals(&cone));
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let sphere = uv_sphere(0.05, 16, 16);
        assert_eq!(sphere.vertex_count(), 17 * 17);
        assert!(sphere
            .vertices
            .iter()
            .all(|v| (Vector3::from(v.position).magnitude() - 0.05).abs() < 1e-6));
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertex_count()));
    }

    #[test]
    fn helix_matches_the_hero_layout() {
        let points = helix_points(20, 2.0, 2.0, 0.3);
        assert_eq!(points.len(), 20);
        assert!((points[0] - Vector3::new(2.0, -3.0, 0.0)).magnitude() < 1e-5);
        // half a turn after five points
        assert!((points[5] - Vector3::new(-2.0, -1.5, 0.0)).magnitude() < 1e-4);
    }

    #[test]
    fn scatter_is_reproducible_and_bounded() {
        let a = scatter(100, 20.0, &mut SmallRng::seed_from_u64(7));
        let b = scatter(100, 20.0, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter().flatten().all(|c| c.abs() <= 10.0));
    }

    #[test]
    fn curve_passes_through_control_points() {
        let points = helix_points(5, 1.0, 1.0, 1.0);
        let curve = CatmullRomCurve::new(points.clone());
        for (i, p) in points.iter().enumerate() {
            let q = curve.point_at(i as f32 / 4.0);
            assert!((q - p).magnitude() < 1e-4, "{} {:?} {:?}", i, p, q);
        }
    }

    #[test]
    fn tube_wraps_the_curve() {
        let curve = CatmullRomCurve::new(helix_points(20, 2.0, 2.0, 0.3));
        let tube = tube(&curve, 64, 0.02, 8, false);
        assert_eq!(tube.vertex_count(), 65 * 9);
        assert_eq!(tube.index_count(), 64 * 8 * 6);
        let start = curve.point_at(0.0);
        assert!(tube.vertices[..9]
            .iter()
            .all(|v| ((Vector3::from(v.position) - start).magnitude() - 0.02).abs() < 1e-4));
    }
}
