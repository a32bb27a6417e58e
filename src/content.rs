//! Builders for the visual content a view can mount.
//!
//! Each builder fills an empty [`Scene`], returns the camera looking at it, the driver
//! that animates it and, where the content is interactive, an orbit controller. All
//! randomness is drawn here from the caller's RNG; frames never touch it.

use cgmath::{InnerSpace, Vector3};
use log::info;
use rand::Rng;

use crate::{
    animation::{
        Animator, Animators, ClockUniformDriver, HelixDriver, IncrementalSpinDriver,
        OrbitingLightsDriver, SpinDriver,
    },
    camera::{Camera, OrbitController},
    config::SceneContent,
    data_structures::{
        geometry::{self, CatmullRomCurve},
        instance::Instance,
        material::{Material, hex},
        scene_graph::{Layer, Light, NodeKind, Scene},
    },
};

/// Everything a content builder hands back besides the populated scene.
pub struct Content {
    pub camera: Camera,
    pub animator: Box<dyn Animator>,
    pub controller: Option<OrbitController>,
}

pub fn build<R: Rng + ?Sized>(content: SceneContent, scene: &mut Scene, aspect: f32, rng: &mut R) -> Content {
    let built = match content {
        SceneContent::Helix => helix(scene, aspect, rng),
        SceneContent::ParticleField => particle_field(scene, aspect, rng),
        SceneContent::ShaderBackdrop => shader_backdrop(scene),
        SceneContent::SpinningCube => spinning_cube(scene, aspect),
    };
    scene.update_world_transforms();
    info!(
        "built '{}' content: {} nodes, {} geometries",
        content.name(),
        scene.len(),
        scene.geometries().count()
    );
    built
}

pub const HELIX_ICONS: usize = 20;

/// Play-icon helix joined by a tube, with slowly turning particles around it.
pub fn helix<R: Rng + ?Sized>(scene: &mut Scene, aspect: f32, rng: &mut R) -> Content {
    scene.add("ambient", Light::ambient([1.0; 3], 0.5).into(), Instance::new());
    scene.add(
        "cyan key",
        Light::point(hex(0x00ffff), 1.0, 0.0).into(),
        Instance::at((10.0, 10.0, 10.0)),
    );
    scene.add(
        "magenta fill",
        Light::point(hex(0xda00ff), 0.5, 0.0).into(),
        Instance::at((-10.0, -10.0, -10.0)),
    );

    let helix = scene.add("helix", NodeKind::Group, Instance::new());
    let points = geometry::helix_points(HELIX_ICONS, 2.0, 2.0, 0.3);

    let cone = scene.add_geometry(geometry::cone(0.1, 0.2, 3));
    let red = hex(0xff0000);
    let icon_material = Material::standard(red).with_emissive(red, 0.3);
    let mut icons = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        // the float group is what animates, the icon sits on the helix inside it
        let float = scene.add_child(helix, format!("float {i}"), NodeKind::Group, Instance::new());
        let icon = scene.add_child(
            float,
            format!("play icon {i}"),
            NodeKind::Mesh {
                geometry: cone,
                material: icon_material,
            },
            Instance::at(*point),
        );
        scene.set_layer(icon, Layer::Glow);
        icons.push(float);
    }

    let cyan = hex(0x00ffff);
    let tube = scene.add_geometry(geometry::tube(&CatmullRomCurve::new(points), 64, 0.02, 8, false));
    let link = scene.add_child(
        helix,
        "links",
        NodeKind::Mesh {
            geometry: tube,
            material: Material::standard(cyan).with_emissive(cyan, 0.2),
        },
        Instance::new(),
    );
    scene.set_layer(link, Layer::Glow);

    let particles = scene.add_geometry(geometry::point_cloud(geometry::scatter(100, 20.0, rng)));
    let particles = scene.add(
        "particles",
        NodeKind::Points {
            geometry: particles,
            material: Material::points(hex(0xda00ff), 0.05),
        },
        Instance::new(),
    );

    let camera = Camera::perspective(60.0, aspect, 0.1, 1000.0).at((0.0, 0.0, 10.0));
    let controller = OrbitController::from_camera(&camera).with_auto_rotate(0.5);
    let animator = Animators::new()
        .with(HelixDriver::new(helix, icons))
        .with(SpinDriver::new(particles, 0.1));

    Content {
        camera,
        animator: Box::new(animator),
        controller: Some(controller),
    }
}

pub const PARTICLE_COUNT: usize = 100_000;

/// Dense white point cloud lit by three coloured lights whose bulbs glow.
pub fn particle_field<R: Rng + ?Sized>(scene: &mut Scene, aspect: f32, rng: &mut R) -> Content {
    let cloud = scene.add_geometry(geometry::point_cloud(geometry::scatter(PARTICLE_COUNT, 4.0, rng)));
    scene.add(
        "particles",
        NodeKind::Points {
            geometry: cloud,
            material: Material::points([1.0; 3], 0.01),
        },
        Instance::new(),
    );

    let bulb = scene.add_geometry(geometry::uv_sphere(0.05, 16, 16));
    let lights = [0xffaa00, 0x0040ff, 0x80ff80].map(|rgb| {
        let color = hex(rgb);
        let light = scene.add(
            format!("light {rgb:06x}"),
            Light::point(color, 1.0, 5.0).into(),
            Instance::new(),
        );
        let sphere = scene.add_child(
            light,
            format!("bulb {rgb:06x}"),
            NodeKind::Mesh {
                geometry: bulb,
                material: Material::basic(color),
            },
            Instance::new(),
        );
        scene.set_layer(sphere, Layer::Glow);
        light
    });

    let camera = Camera::perspective(60.0, aspect, 0.1, 100.0).at((0.0, 0.0, 3.0));
    let controller = OrbitController::from_camera(&camera).with_damping(0.05);
    Content {
        camera,
        animator: Box::new(OrbitingLightsDriver::new(lights)),
        controller: Some(controller),
    }
}

/// Fullscreen quad shaded from the uniform set.
pub fn shader_backdrop(scene: &mut Scene) -> Content {
    let quad = scene.add_geometry(geometry::plane(2.0, 2.0));
    scene.add(
        "backdrop",
        NodeKind::Mesh {
            geometry: quad,
            material: Material::Backdrop,
        },
        Instance::new(),
    );
    Content {
        camera: Camera::orthographic(-1.0, 1.0, 1.0, -1.0, 0.0, 1.0),
        animator: Box::new(ClockUniformDriver),
        controller: None,
    }
}

/// One green cube turning at 0.01 rad per frame of a 60 Hz display.
pub fn spinning_cube(scene: &mut Scene, aspect: f32) -> Content {
    let cube = scene.add_geometry(geometry::cuboid(1.0, 1.0, 1.0));
    let cube = scene.add(
        "cube",
        NodeKind::Mesh {
            geometry: cube,
            material: Material::standard(hex(0x00ff00)),
        },
        Instance::new(),
    );
    let direction = Vector3::new(0.0, 1.0, 1.0).normalize();
    scene.add(
        "sun",
        Light::directional([1.0; 3], 1.0).into(),
        Instance::at(direction),
    );

    Content {
        camera: Camera::perspective(75.0, aspect, 0.1, 1000.0).at((0.0, 0.0, 5.0)),
        animator: Box::new(IncrementalSpinDriver::new(cube, (0.6, 0.6))),
        controller: None,
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;
    use crate::data_structures::geometry::Topology;

    #[test]
    fn helix_has_twenty_glowing_icons() {
        let mut scene = Scene::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let content = build(SceneContent::Helix, &mut scene, 1.0, &mut rng);

        let glowing = scene
            .renderables()
            .filter(|(_, node)| node.layer == Layer::Glow)
            .count();
        assert_eq!(glowing, HELIX_ICONS + 1);
        assert_eq!(scene.lights().count(), 3);
        assert_eq!(content.camera.position.z, 10.0);
        assert!(content.controller.is_some());
    }

    #[test]
    fn same_seed_same_particles() {
        let positions = |seed| {
            let mut scene = Scene::new();
            let mut rng = SmallRng::seed_from_u64(seed);
            helix(&mut scene, 1.0, &mut rng);
            scene
                .geometries()
                .find(|(_, g)| g.topology == Topology::Points)
                .map(|(_, g)| g.vertices.clone())
                .unwrap()
        };
        assert_eq!(positions(42), positions(42));
        assert_ne!(positions(42), positions(43));
    }

    #[test]
    fn particle_field_bulbs_follow_their_lights() {
        let mut scene = Scene::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut content = particle_field(&mut scene, 1.0, &mut rng);
        let mut uniforms = crate::data_structures::uniforms::UniformSet::new((800, 600).into());
        content.animator.update(
            &mut scene,
            &mut uniforms,
            crate::clock::FrameTime { elapsed: 0.0, delta: 0.0 },
        );
        scene.update_world_transforms();

        let bulb = scene
            .iter()
            .find(|(_, node)| node.name == "bulb ffaa00")
            .map(|(_, node)| node.world_position())
            .unwrap();
        assert!((bulb.y - 1.5).abs() < 1e-5 && (bulb.z - 1.5).abs() < 1e-5);
    }

    #[test]
    fn backdrop_uses_fixed_orthographic_bounds() {
        let mut scene = Scene::new();
        let content = shader_backdrop(&mut scene);
        assert!(matches!(
            content.camera.projection,
            crate::camera::Projection::Orthographic { left, right, .. } if left == -1.0 && right == 1.0
        ));
        assert_eq!(scene.renderables().count(), 1);
    }
}
