mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use common::test_utils::{mount, mount_with};
use glow_ngin::{
    BloomSettings, FrameOutcome, SceneConfig, SceneContent, SceneView,
    backend::{
        PassTarget,
        headless::{Call, HeadlessBackend},
    },
    data_structures::{material::Material, scene_graph::Layer},
};

fn bloom_config(content: SceneContent) -> SceneConfig {
    SceneConfig::new(content).with_bloom(BloomSettings::default())
}

fn materials<B: glow_ngin::backend::RenderBackend>(view: &SceneView<B>) -> Vec<(String, Material)> {
    view.scene()
        .renderables()
        .filter_map(|(_, node)| node.material().map(|m| (node.name.clone(), *m)))
        .collect()
}

#[test]
fn bloom_frame_runs_glow_base_then_composite() {
    let mut m = mount(bloom_config(SceneContent::Helix));
    assert_eq!(m.step(0.016), FrameOutcome::Rendered);

    let log = m.log.borrow();
    let frame: Vec<_> = log
        .calls
        .iter()
        .skip_while(|call| **call != Call::BeginFrame)
        .map(|call| match call {
            Call::Draw(draw) => format!("draw {:?}", draw.target),
            other => format!("{other:?}"),
        })
        .collect();
    let composite = format!("{:?}", Call::Composite(BloomSettings::default()));
    assert_eq!(
        frame,
        vec!["BeginFrame", "draw Glow", "draw Base", composite.as_str(), "EndFrame"]
    );
}

#[test]
fn glow_pass_sees_only_glow_layer_materials() {
    let mut m = mount(bloom_config(SceneContent::Helix));
    m.step(0.016);

    let glow_nodes: Vec<String> = m
        .view
        .scene()
        .renderables()
        .filter(|(_, node)| node.layer == Layer::Glow)
        .map(|(_, node)| node.name.clone())
        .collect();
    assert!(glow_nodes.iter().any(|name| name == "play icon 0"));
    assert!(glow_nodes.iter().any(|name| name == "links"));

    let log = m.log.borrow();
    let draws: Vec<_> = log.draws().collect();
    let (glow, base) = (draws[0], draws[1]);
    for ((name, glowing), (_, original)) in glow.materials.iter().zip(&base.materials) {
        if glow_nodes.contains(name) {
            assert_eq!(glowing, original, "{name} should keep its material");
        } else {
            assert_eq!(*glowing, Material::dark(), "{name} should be darkened");
        }
    }
    assert_ne!(
        base.materials
            .iter()
            .find(|(name, _)| name == "particles")
            .map(|(_, material)| *material),
        Some(Material::dark())
    );
}

#[test]
fn materials_are_restored_after_a_failing_glow_pass() {
    let mut m = mount_with(
        bloom_config(SceneContent::ParticleField),
        HeadlessBackend::new().failing_on(PassTarget::Glow),
    );
    let before = materials(&m.view);

    assert_eq!(m.step(0.016), FrameOutcome::Failed);
    assert_eq!(materials(&m.view), before);
    assert!(!m.log.borrow().draws().any(|draw| draw.target == PassTarget::Base));

    m.view.backend_mut().set_fail_pass(None);
    assert_eq!(m.step(0.016), FrameOutcome::Rendered);
    assert_eq!(materials(&m.view), before);
}

#[test]
fn materials_are_restored_after_a_panicking_glow_pass() {
    let mut m = mount_with(
        bloom_config(SceneContent::Helix),
        HeadlessBackend::new().panicking_on(PassTarget::Glow),
    );
    let before = materials(&m.view);

    m.clock.advance(0.016);
    let result = catch_unwind(AssertUnwindSafe(|| m.view.frame()));
    assert!(result.is_err());
    assert_eq!(materials(&m.view), before);
    assert!(materials(&m.view).iter().all(|(name, material)| {
        name.starts_with("play icon") || name == "links" || *material != Material::dark()
    }));
}

#[test]
fn failing_base_pass_skips_the_composite() {
    let mut m = mount_with(
        bloom_config(SceneContent::Helix),
        HeadlessBackend::new().failing_on(PassTarget::Base),
    );
    assert_eq!(m.step(0.016), FrameOutcome::Failed);
    let log = m.log.borrow();
    assert!(!log.calls.iter().any(|call| matches!(call, Call::Composite(_))));
    assert_eq!(log.calls.last(), Some(&Call::AbortFrame));
}

#[test]
fn plain_frames_draw_straight_to_the_surface() {
    let mut m = mount(SceneConfig::new(SceneContent::Helix));
    m.step(0.016);
    let log = m.log.borrow();
    let targets: Vec<_> = log.draws().map(|draw| draw.target).collect();
    assert_eq!(targets, vec![PassTarget::Surface]);
    assert!(!log.calls.iter().any(|call| matches!(call, Call::Composite(_))));
}

#[test]
fn bloom_targets_are_released_with_the_view() {
    let mut m = mount(bloom_config(SceneContent::ParticleField).with_antialias(false));
    m.step(0.016);
    m.view.stop();
    let log = m.log.borrow();
    for label in [
        "glow target",
        "base target",
        "blur target",
        "blur pipeline",
        "composite pipeline",
    ] {
        assert!(log.released.iter().any(|released| released == label), "{label} leaked");
    }
    assert!(!log.released.iter().any(|released| released == "msaa texture"));
}
