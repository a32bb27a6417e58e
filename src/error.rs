//! Error types shared by the lifecycle, the backends and the host loop.

use crate::{backend::PassTarget, view::Lifecycle};

/// Everything that can go wrong while mounting, running or tearing down a scene view.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The display surface to mount into does not exist or has no area.
    #[error("mount target unavailable: {0}")]
    MountTargetUnavailable(String),

    #[error("invalid scene configuration: {0}")]
    InvalidConfig(String),

    #[error("no suitable graphics adapter: {0}")]
    AdapterUnavailable(String),

    #[error("graphics device request failed: {0}")]
    DeviceUnavailable(String),

    #[error("could not create a drawing surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// An operation was requested in a lifecycle state that does not allow it.
    #[error("cannot {action} a view that is {state:?}")]
    Lifecycle {
        action: &'static str,
        state: Lifecycle,
    },

    #[error("{0:?} pass failed: {1}")]
    Pass(PassTarget, String),

    #[error("no frame in flight; begin_frame must precede {0}")]
    NoFrame(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failed_step() {
        let err = SceneError::MountTargetUnavailable("canvas #hero not found".to_string());
        assert_eq!(err.to_string(), "mount target unavailable: canvas #hero not found");

        let err = SceneError::Lifecycle {
            action: "start",
            state: Lifecycle::Unmounted,
        };
        assert_eq!(err.to_string(), "cannot start a view that is Unmounted");
    }
}
