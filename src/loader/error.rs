use thiserror::Error;

use super::host::HostError;

/// Something that went wrong during a scene transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFault {
    #[error("could not show loading overlay `{scene}`")]
    OverlayUnavailable {
        scene: String,
        #[source]
        source: HostError,
    },
    #[error("failed to unload scene `{scene}`")]
    Unload {
        scene: String,
        #[source]
        source: HostError,
    },
    #[error("failed to load scene `{scene}`")]
    Load {
        scene: String,
        #[source]
        source: HostError,
    },
    #[error("failed to reclaim unused resources")]
    Reclaim(#[source] HostError),
    #[error("restore flag was dropped before it was raised")]
    RestoreFlagDropped,
    #[error("failed to unload loading overlay `{scene}`")]
    OverlayUnload {
        scene: String,
        #[source]
        source: HostError,
    },
}

impl LoadFault {
    /// Whether the transition had to be cut short.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RestoreFlagDropped | Self::OverlayUnload { .. })
    }
}
