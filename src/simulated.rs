//! An in-memory [`SceneHost`] whose operations take simulated time.
//!
//! Scenes are plain names with a load duration. Nothing is actually
//! spawned: callers look at [`SceneHost::active_scenes`] and build their
//! content from that.

use std::{collections::BTreeMap, time::Duration};

use rand::Rng;

use crate::loader::{HOST_PROGRESS_CEILING, HostError, OperationId, OperationStatus, SceneHost};

#[derive(Debug)]
enum Kind {
    Load { scene: String, allow_activation: bool },
    Unload(String),
    Reclaim,
}

#[derive(Debug)]
struct Operation {
    kind: Kind,
    elapsed: f32,
    duration: f32,
    done: bool,
}

impl Operation {
    fn status(&self) -> OperationStatus {
        if self.done {
            return OperationStatus::DONE;
        }
        let ratio = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        match self.kind {
            Kind::Load { .. } => OperationStatus::pending(ratio * HOST_PROGRESS_CEILING),
            Kind::Unload(_) | Kind::Reclaim => OperationStatus::pending(ratio),
        }
    }
}

#[derive(Debug, Default)]
pub struct SimulatedHost {
    load_secs: BTreeMap<String, f32>,
    active: Vec<String>,
    operations: BTreeMap<OperationId, Operation>,
    next_id: u64,
    unload_secs: f32,
    jitter: f32,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loadable scene taking `load_secs` to load.
    pub fn with_scene(mut self, scene: impl Into<String>, load_secs: f32) -> Self {
        self.load_secs.insert(scene.into(), load_secs.max(0.0));
        self
    }

    /// Marks an already registered scene as active from the start.
    pub fn with_active(mut self, scene: impl Into<String>) -> Self {
        self.active.push(scene.into());
        self
    }

    pub fn with_unload_secs(mut self, secs: f32) -> Self {
        self.unload_secs = secs.max(0.0);
        self
    }

    /// Scales each load by a random factor in `1 ± jitter`.
    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.clamp(0.0, 0.9);
        self
    }

    fn start(&mut self, kind: Kind, duration: f32) -> OperationId {
        self.next_id += 1;
        let id = OperationId(self.next_id);
        self.operations.insert(
            id,
            Operation {
                kind,
                elapsed: 0.0,
                duration,
                done: false,
            },
        );
        id
    }
}

impl SceneHost for SimulatedHost {
    fn active_scenes(&self) -> Vec<String> {
        self.active.clone()
    }

    fn unload_scene(&mut self, scene: &str) -> Result<OperationId, HostError> {
        if !self.active.iter().any(|active| active == scene) {
            return Err(HostError::SceneNotLoaded(scene.to_string()));
        }
        let duration = self.unload_secs;
        Ok(self.start(Kind::Unload(scene.to_string()), duration))
    }

    fn load_scene(
        &mut self,
        scene: &str,
        activate_immediately: bool,
    ) -> Result<OperationId, HostError> {
        let Some(&base) = self.load_secs.get(scene) else {
            return Err(HostError::UnknownScene(scene.to_string()));
        };
        let duration = if self.jitter > 0.0 && base > 0.0 {
            base * rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter)
        } else {
            base
        };
        let kind = Kind::Load {
            scene: scene.to_string(),
            allow_activation: activate_immediately,
        };
        Ok(self.start(kind, duration))
    }

    fn poll(&mut self, op: OperationId) -> Result<OperationStatus, HostError> {
        self.operations
            .get(&op)
            .map(Operation::status)
            .ok_or(HostError::UnknownOperation(op))
    }

    fn allow_activation(&mut self, op: OperationId) {
        if let Some(Operation {
            kind: Kind::Load {
                allow_activation, ..
            },
            ..
        }) = self.operations.get_mut(&op)
        {
            *allow_activation = true;
        }
    }

    fn reclaim_unused_resources(&mut self) -> OperationId {
        self.start(Kind::Reclaim, 0.0)
    }

    fn tick(&mut self, delta: Duration) {
        let delta = delta.as_secs_f32();
        for operation in self.operations.values_mut().filter(|op| !op.done) {
            operation.elapsed += delta;
            if operation.elapsed < operation.duration {
                continue;
            }
            match &operation.kind {
                Kind::Load {
                    scene,
                    allow_activation,
                } => {
                    if !allow_activation {
                        continue;
                    }
                    self.active.push(scene.clone());
                }
                Kind::Unload(scene) => {
                    if let Some(index) = self.active.iter().position(|active| active == scene) {
                        self.active.remove(index);
                    }
                }
                Kind::Reclaim => {}
            }
            operation.done = true;
        }
    }
}
