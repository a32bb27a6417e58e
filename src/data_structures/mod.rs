//! Scene data: geometry, materials, transforms, uniforms and the scene graph.
//!
//! - `geometry` holds the pure builders (boxes, cones, spheres, tubes, point clouds)
//! - `instance` holds local transforms and the per-draw GPU record
//! - `material` holds the materials owned by renderable nodes
//! - `scene_graph` is the per-view node arena
//! - `texture` wraps GPU render attachments
//! - `uniforms` holds the shader uniform set and the lighting block

pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;
pub mod uniforms;
