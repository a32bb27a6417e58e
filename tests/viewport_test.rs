mod common;

use common::test_utils::mount;
use glow_ngin::{
    BloomSettings, FrameOutcome, SceneConfig, SceneContent, SurfaceSize,
    backend::{RenderBackend, headless::Call},
    host::EventKind,
    resources::ResourceKind,
};

fn resize_calls(calls: &[Call]) -> Vec<SurfaceSize> {
    calls
        .iter()
        .filter_map(|call| match call {
            Call::Resize(size) => Some(*size),
            _ => None,
        })
        .collect()
}

#[test]
fn resize_is_applied_at_the_next_frame() {
    let mut m = mount(SceneConfig::new(SceneContent::SpinningCube).with_size(800, 600));
    assert!((m.view.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);

    m.view.resize(SurfaceSize::new(1024, 768));
    // nothing changes between frames
    assert_eq!(m.view.backend().size(), SurfaceSize::new(800, 600));

    assert_eq!(m.step(0.016), FrameOutcome::Rendered);
    assert!((m.view.camera().aspect() - 1024.0 / 768.0).abs() < 1e-6);
    assert_eq!(m.view.backend().size(), SurfaceSize::new(1024, 768));
    assert_eq!(m.view.uniforms().resolution.x, 1024.0);
    assert_eq!(m.view.uniforms().resolution.y, 768.0);

    let log = m.log.borrow();
    let draw = log.draws().last().unwrap();
    assert!((draw.aspect - 1.333_333).abs() < 1e-4);
}

#[test]
fn only_the_latest_resize_between_frames_is_applied() {
    let mut m = mount(SceneConfig::new(SceneContent::SpinningCube).with_size(800, 600));
    m.view.resize(SurfaceSize::new(640, 480));
    m.view.resize(SurfaceSize::new(1920, 1080));
    m.step(0.016);
    assert_eq!(
        resize_calls(&m.log.borrow().calls),
        vec![SurfaceSize::new(1920, 1080)]
    );
}

#[test]
fn zero_sized_resize_is_ignored() {
    let mut m = mount(SceneConfig::new(SceneContent::Helix).with_size(800, 600));
    m.view.resize(SurfaceSize::new(0, 0));
    m.view.resize(SurfaceSize::new(1024, 0));
    assert_eq!(m.step(0.016), FrameOutcome::Rendered);
    assert!(resize_calls(&m.log.borrow().calls).is_empty());
    assert!((m.view.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn resize_recreates_size_dependent_targets_without_leaking() {
    let mut m = mount(SceneConfig::new(SceneContent::SpinningCube));
    let textures = m.view.resources().live_of(ResourceKind::Texture);
    let live = m.view.resources().live();

    for width in [300, 400, 500] {
        m.view.resize(SurfaceSize::new(width, 300));
        m.step(0.016);
    }
    assert_eq!(m.view.resources().live_of(ResourceKind::Texture), textures);
    assert_eq!(m.view.resources().live(), live);
    let released = m.log.borrow().released.clone();
    assert_eq!(
        released.iter().filter(|label| *label == "depth texture").count(),
        3
    );

    m.view.stop();
    assert!(m.view.resources().is_balanced());
}

#[test]
fn long_running_resizes_keep_the_resource_count_steady() {
    let mut m = mount(SceneConfig::new(SceneContent::SpinningCube).with_bloom(BloomSettings::default()));
    let live = m.view.resources().live();

    for cycle in 0..1000 {
        m.view.resize(SurfaceSize::new(400 + cycle % 7, 300));
        assert_eq!(m.step(0.016), FrameOutcome::Rendered);
    }
    let resources = m.view.resources();
    assert_eq!(resources.live(), live);
    assert_eq!(resources.acquired() - resources.released(), live);

    m.view.stop();
    assert!(m.view.resources().is_balanced());
    assert_eq!(m.log.borrow().released.len(), m.view.resources().acquired());
}

#[test]
fn failed_resize_is_retried_on_the_next_frame() {
    let mut m = mount(SceneConfig::new(SceneContent::SpinningCube).with_size(800, 600));
    let live = m.view.resources().live();
    m.view.resize(SurfaceSize::new(1024, 768));
    m.view.backend_mut().set_fail_resize(true);

    assert_eq!(m.step(0.016), FrameOutcome::Failed);
    assert!((m.view.camera().aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!(m.view.uniforms().resolution.x, 800.0);
    assert_eq!(m.view.backend().size(), SurfaceSize::new(800, 600));
    assert_eq!(m.view.resources().live(), live);

    m.view.backend_mut().set_fail_resize(false);
    assert_eq!(m.step(0.016), FrameOutcome::Rendered);
    assert!((m.view.camera().aspect() - 1024.0 / 768.0).abs() < 1e-6);
    assert_eq!(m.view.backend().size(), SurfaceSize::new(1024, 768));
    assert_eq!(
        resize_calls(&m.log.borrow().calls),
        vec![SurfaceSize::new(1024, 768), SurfaceSize::new(1024, 768)]
    );
}

#[test]
fn pointer_in_the_centre_maps_to_the_origin() {
    let mut m = mount(SceneConfig::new(SceneContent::ShaderBackdrop).with_size(1920, 1080));
    assert!(m.host.borrow().is_subscribed(EventKind::PointerMove));

    m.view.pointer_move(960.0, 540.0);
    assert_eq!(m.view.uniforms().mouse.x, 0.0);
    assert_eq!(m.view.uniforms().mouse.y, 0.0);

    m.view.pointer_move(0.0, 0.0);
    assert_eq!(m.view.uniforms().mouse.x, -1.0);
    assert_eq!(m.view.uniforms().mouse.y, 1.0);

    m.view.pointer_move(1920.0, 1080.0);
    assert_eq!(m.view.uniforms().mouse.x, 1.0);
    assert_eq!(m.view.uniforms().mouse.y, -1.0);
}

#[test]
fn pointer_is_seen_by_the_next_frame() {
    let mut m = mount(SceneConfig::new(SceneContent::ShaderBackdrop).with_size(400, 200));
    m.view.pointer_move(300.0, 50.0);
    // no frame is rendered by the pointer itself
    assert_eq!(m.log.borrow().presented_frames(), 0);

    m.step(0.0);
    let log = m.log.borrow();
    let draw = log.draws().last().unwrap();
    assert_eq!(draw.mouse, [0.5, 0.5]);
}

#[test]
fn static_content_does_not_listen_to_the_pointer() {
    let m = mount(SceneConfig::new(SceneContent::SpinningCube));
    let host = m.host.borrow();
    assert!(host.is_subscribed(EventKind::Resize));
    assert!(!host.is_subscribed(EventKind::PointerMove));
}

#[test]
fn dragging_orbits_the_particle_field_camera() {
    let mut m = mount(SceneConfig::new(SceneContent::ParticleField).with_size(800, 800));
    let azimuth = m.view.controller().unwrap().azimuth();

    // moving without a press does nothing
    m.view.pointer_move(100.0, 100.0);
    m.view.pointer_move(300.0, 100.0);
    m.step(0.016);
    assert_eq!(m.view.controller().unwrap().azimuth(), azimuth);

    let before = m.view.camera().position;
    // pressed at (300, 100), dragged a quarter of the height to the right
    m.view.pointer_pressed(true);
    m.view.pointer_move(500.0, 100.0);
    m.view.pointer_pressed(false);
    m.step(0.016);

    // damped: the first frame applies 5% of the drag
    let moved = m.view.controller().unwrap().azimuth();
    assert!((moved.0 - azimuth.0).abs() > 0.05);
    assert_ne!(m.view.camera().position, before);

    let first = moved.0 - azimuth.0;
    m.step(0.016);
    let second = m.view.controller().unwrap().azimuth().0 - moved.0;
    assert!(second.abs() < first.abs());
}
