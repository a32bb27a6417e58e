//! Cameras, projections and the orbit controller.
//!
//! A [`Camera`] is mutated by two parties only: the viewport adapter (aspect ratio on
//! resize) and the [`OrbitController`] (position). Both run inside the frame callback,
//! before the render that consumes the camera.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fovy: Deg<f32>,
        znear: f32,
        zfar: f32,
    },
    /// Fixed clip-space bounds; the backdrop quad always spans them regardless of aspect.
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        znear: f32,
        zfar: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub projection: Projection,
    aspect: f32,
}

impl Camera {
    pub fn perspective(fovy: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            projection: Projection::Perspective {
                fovy: Deg(fovy),
                znear,
                zfar,
            },
            aspect,
        }
    }

    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, znear: f32, zfar: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 0.5),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            projection: Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                znear,
                zfar,
            },
            aspect: 1.0,
        }
    }

    pub fn at(mut self, position: impl Into<Point3<f32>>) -> Self {
        self.position = position.into();
        self
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let proj = match self.projection {
            Projection::Perspective { fovy, znear, zfar } => {
                cgmath::perspective(fovy, self.aspect, znear, zfar)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                znear,
                zfar,
            } => cgmath::ortho(left, right, bottom, top, znear, zfar),
        };
        OPENGL_TO_WGPU_MATRIX * proj
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Orbits the camera around a target on a sphere, optionally auto-rotating.
///
/// Unlike the animation drivers this controller is stateful: the azimuth accumulates
/// frame after frame from `delta`, so `azimuth(t + d) = azimuth(t) - k * d` while no drag
/// velocity is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    pub target: Point3<f32>,
    /// Same unit as three.js' `autoRotateSpeed`: 1.0 is one turn per minute.
    pub auto_rotate_speed: f32,
    /// Fraction of the pending drag velocity applied per frame, 0 disables damping.
    pub damping: f32,
    radius: f32,
    azimuth: f32,
    polar: f32,
    pending: (f32, f32),
}

const POLAR_EPSILON: f32 = 1e-4;

impl OrbitController {
    pub fn from_camera(camera: &Camera) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();
        let (azimuth, polar) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, std::f32::consts::FRAC_PI_2)
        };
        Self {
            target: camera.target,
            auto_rotate_speed: 0.0,
            damping: 0.0,
            radius,
            azimuth,
            polar,
            pending: (0.0, 0.0),
        }
    }

    pub fn with_auto_rotate(mut self, speed: f32) -> Self {
        self.auto_rotate_speed = speed;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn azimuth(&self) -> Rad<f32> {
        Rad(self.azimuth)
    }

    pub fn polar(&self) -> Rad<f32> {
        Rad(self.polar)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Queue a user rotation, in radians, consumed by the next `update` calls.
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.pending.0 += d_azimuth;
        self.pending.1 += d_polar;
    }

    /// Radians the auto-rotation advances per second.
    pub fn auto_rotate_rate(&self) -> f32 {
        2.0 * std::f32::consts::PI / 60.0 * self.auto_rotate_speed
    }

    pub fn update(&mut self, camera: &mut Camera, delta: f32) {
        self.azimuth -= self.auto_rotate_rate() * delta;

        let factor = if self.damping > 0.0 { self.damping } else { 1.0 };
        self.azimuth += self.pending.0 * factor;
        self.polar += self.pending.1 * factor;
        self.pending.0 *= 1.0 - factor;
        self.pending.1 *= 1.0 - factor;
        self.polar = self
            .polar
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let offset = Vector3::new(
            self.radius * sin_polar * sin_az,
            self.radius * cos_polar,
            self.radius * sin_polar * cos_az,
        );
        camera.target = self.target;
        camera.position = self.target + offset;
    }
}
