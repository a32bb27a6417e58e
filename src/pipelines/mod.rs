//! Render pipelines and their WGSL shaders.
//!
//! - `basic` holds the shared pipeline constructor and uniform layouts
//! - `scene` builds the mesh, point and backdrop pipelines
//! - `post` builds the blur and composite passes of the bloom path

pub mod basic;
pub mod post;
pub mod scene;
