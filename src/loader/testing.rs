//! A scripted [`SceneHost`] whose state the test keeps a handle to.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::host::{HostError, OperationId, OperationStatus, SceneHost};

#[derive(Debug)]
enum Kind {
    Load {
        scene: String,
        immediate: bool,
        allowed: bool,
    },
    Unload(String),
    Reclaim,
}

#[derive(Debug)]
struct Operation {
    kind: Kind,
    done: bool,
}

#[derive(Debug, Default)]
pub struct ScriptState {
    pub active: Vec<String>,
    pub trace: Vec<String>,
    /// Progress reported by deferred loads until they are activated.
    pub raw_progress: f32,
    /// Polls an unload stays pending for.
    pub unload_polls: u32,
    pub unknown: Vec<String>,
    pub refuse_overlay: bool,
    /// Scenes whose unload is accepted but then fails when polled.
    pub failing_unloads: Vec<String>,
    operations: BTreeMap<OperationId, Operation>,
    next_id: u64,
}

impl ScriptState {
    fn start(&mut self, kind: Kind) -> OperationId {
        self.next_id += 1;
        let id = OperationId(self.next_id);
        self.operations.insert(id, Operation { kind, done: false });
        id
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedHost(Arc<Mutex<ScriptState>>);

impl ScriptedHost {
    pub fn with_active(scenes: &[&str]) -> Self {
        let host = Self::default();
        host.state().active = scenes.iter().map(|scene| scene.to_string()).collect();
        host
    }

    pub fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.0.lock().unwrap()
    }

    pub fn trace(&self) -> Vec<String> {
        self.state().trace.clone()
    }

    pub fn set_progress(&self, raw: f32) {
        self.state().raw_progress = raw;
    }
}

impl SceneHost for ScriptedHost {
    fn active_scenes(&self) -> Vec<String> {
        self.state().active.clone()
    }

    fn unload_scene(&mut self, scene: &str) -> Result<OperationId, HostError> {
        let mut state = self.state();
        if !state.active.iter().any(|active| active == scene) {
            return Err(HostError::SceneNotLoaded(scene.to_string()));
        }
        state.trace.push(format!("unload {scene}"));
        Ok(state.start(Kind::Unload(scene.to_string())))
    }

    fn load_scene(
        &mut self,
        scene: &str,
        activate_immediately: bool,
    ) -> Result<OperationId, HostError> {
        let mut state = self.state();
        let refused = activate_immediately && state.refuse_overlay;
        if refused || state.unknown.iter().any(|unknown| unknown == scene) {
            return Err(HostError::UnknownScene(scene.to_string()));
        }
        state.trace.push(format!("load {scene}"));
        Ok(state.start(Kind::Load {
            scene: scene.to_string(),
            immediate: activate_immediately,
            allowed: false,
        }))
    }

    fn poll(&mut self, op: OperationId) -> Result<OperationStatus, HostError> {
        let mut guard = self.state();
        let state = &mut *guard;
        let operation = state
            .operations
            .get_mut(&op)
            .ok_or(HostError::UnknownOperation(op))?;
        if operation.done {
            return Ok(OperationStatus::DONE);
        }
        match &operation.kind {
            Kind::Unload(scene) => {
                if state.failing_unloads.contains(scene) {
                    return Err(HostError::SceneNotLoaded(scene.clone()));
                }
                if state.unload_polls > 0 {
                    state.unload_polls -= 1;
                    return Ok(OperationStatus::pending(0.5));
                }
                if let Some(index) = state.active.iter().position(|active| active == scene) {
                    state.active.remove(index);
                }
            }
            Kind::Reclaim => {}
            Kind::Load {
                scene,
                immediate,
                allowed,
            } => {
                let ready = *immediate || (*allowed && state.raw_progress >= 0.9);
                if !ready {
                    return Ok(OperationStatus::pending(state.raw_progress.min(0.9)));
                }
                state.trace.push(format!("activate {scene}"));
                state.active.push(scene.clone());
            }
        }
        operation.done = true;
        Ok(OperationStatus::DONE)
    }

    fn allow_activation(&mut self, op: OperationId) {
        let mut guard = self.state();
        let state = &mut *guard;
        if let Some(Operation {
            kind: Kind::Load { scene, allowed, .. },
            ..
        }) = state.operations.get_mut(&op)
        {
            *allowed = true;
            state.trace.push(format!("allow {scene}"));
        }
    }

    fn reclaim_unused_resources(&mut self) -> OperationId {
        let mut state = self.state();
        state.trace.push("reclaim".to_string());
        state.start(Kind::Reclaim)
    }

    fn force_collect(&mut self) {
        self.state().trace.push("collect".to_string());
    }
}
