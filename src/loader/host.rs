//! The scene manager the loader drives.

use std::time::Duration;

use thiserror::Error;

/// Handle of an asynchronous host operation (load, unload or reclaim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u64);

/// Snapshot of an asynchronous host operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationStatus {
    /// Load progress over `[0, 0.9]` by host convention; the rest is
    /// reserved for activation.
    pub progress: f32,
    pub done: bool,
}

impl OperationStatus {
    pub const DONE: Self = Self {
        progress: 1.0,
        done: true,
    };

    pub fn pending(progress: f32) -> Self {
        Self {
            progress,
            done: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("scene `{0}` is not known to the host")]
    UnknownScene(String),
    #[error("scene `{0}` is not loaded")]
    SceneNotLoaded(String),
    #[error("operation {0:?} is not known to the host")]
    UnknownOperation(OperationId),
}

/// Scene manager able to load and unload named scenes asynchronously.
///
/// Every method is called from the single system that ticks the loader, so
/// implementations never see concurrent calls.
pub trait SceneHost: Send + Sync + 'static {
    /// Identifiers of the currently active scenes, in host order.
    fn active_scenes(&self) -> Vec<String>;

    fn unload_scene(&mut self, scene: &str) -> Result<OperationId, HostError>;

    /// Starts loading `scene`. With `activate_immediately` unset the scene
    /// stays fetched-but-inactive until [`SceneHost::allow_activation`].
    fn load_scene(&mut self, scene: &str, activate_immediately: bool)
    -> Result<OperationId, HostError>;

    fn poll(&mut self, op: OperationId) -> Result<OperationStatus, HostError>;

    fn allow_activation(&mut self, op: OperationId);

    fn reclaim_unused_resources(&mut self) -> OperationId;

    /// Synchronous collection run right after reclaiming.
    fn force_collect(&mut self) {}

    /// Advances time-driven hosts. Called once per frame before the loader
    /// polls anything.
    fn tick(&mut self, _delta: Duration) {}
}
