//! The ordered steps of a scene transition.
//!
//! A [`Sequence`] is created for every accepted load request and advanced
//! once per frame. Each phase either finishes within the frame and falls
//! through to the next one, or suspends until the next frame.

use std::{
    collections::VecDeque,
    error::Error as _,
    sync::{Weak, atomic::AtomicBool},
    time::Duration,
};

use bevy::time::{Stopwatch, Timer, TimerMode};
use tracing::{debug, error, info, warn};

use super::{
    LoadingView, PauseCount, SceneLoadFinished,
    config::LoaderConfig,
    error::LoadFault,
    host::{OperationId, SceneHost},
    progress,
    request::{RestoreState, read_restore},
};

/// Coarse view of where a running transition currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    AwaitingOverlay,
    Announcing,
    PreWait,
    UnloadingOthers,
    Reclaiming,
    Loading,
    AwaitingRestore,
    Padding,
    PostWait,
    TearingDown,
    Finished,
}

#[derive(Debug)]
enum Phase {
    AwaitOverlay(OperationId),
    Announce,
    PreWait(Timer),
    UnloadOthers {
        pending: VecDeque<String>,
        current: Option<(String, OperationId)>,
    },
    Reclaim(Option<OperationId>),
    BeginLoad,
    Loading {
        op: OperationId,
        activation_allowed: bool,
    },
    RestoreWait {
        waited: Stopwatch,
        warned: bool,
    },
    Pad(Timer),
    PostWait(Timer),
    Teardown,
    Finished,
}

impl Phase {
    fn stage(&self) -> Stage {
        match self {
            Phase::AwaitOverlay(_) => Stage::AwaitingOverlay,
            Phase::Announce => Stage::Announcing,
            Phase::PreWait(_) => Stage::PreWait,
            Phase::UnloadOthers { .. } => Stage::UnloadingOthers,
            Phase::Reclaim(_) => Stage::Reclaiming,
            Phase::BeginLoad | Phase::Loading { .. } => Stage::Loading,
            Phase::RestoreWait { .. } => Stage::AwaitingRestore,
            Phase::Pad(_) => Stage::Padding,
            Phase::PostWait(_) => Stage::PostWait,
            Phase::Teardown => Stage::TearingDown,
            Phase::Finished => Stage::Finished,
        }
    }
}

enum Flow {
    Continue,
    Yield,
    Finished,
}

/// Everything a sequence touches during one frame.
pub(crate) struct Frame<'a> {
    pub host: &'a mut dyn SceneHost,
    pub config: &'a LoaderConfig,
    pub view: &'a mut LoadingView,
    pub pause: &'a mut PauseCount,
    pub delta: Duration,
}

#[derive(Debug)]
pub(crate) struct Sequence {
    target: String,
    overlay: String,
    restore: Option<Weak<AtomicBool>>,
    phase: Phase,
    /// Time spent since the target load started, restore wait included.
    load_time: Stopwatch,
    paused: bool,
    fault: Option<LoadFault>,
    overlay_unload: Option<OperationId>,
}

impl Sequence {
    pub fn new(
        target: String,
        overlay: String,
        restore: Option<Weak<AtomicBool>>,
        overlay_load: OperationId,
    ) -> Self {
        Self {
            target,
            overlay,
            restore,
            phase: Phase::AwaitOverlay(overlay_load),
            load_time: Stopwatch::new(),
            paused: false,
            fault: None,
            overlay_unload: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.phase.stage()
    }

    #[cfg(test)]
    pub fn restore_warned(&self) -> bool {
        matches!(self.phase, Phase::RestoreWait { warned: true, .. })
    }

    /// Unload of the overlay issued during teardown. Nobody waits for it.
    pub fn take_overlay_unload(&mut self) -> Option<OperationId> {
        self.overlay_unload.take()
    }

    /// Runs phases until one suspends. Returns the result once teardown ran.
    pub fn advance(&mut self, frame: &mut Frame<'_>) -> Option<SceneLoadFinished> {
        self.tick_waits(frame.delta);
        loop {
            match self.step(frame) {
                Flow::Continue => {}
                Flow::Yield => return None,
                Flow::Finished => {
                    return Some(SceneLoadFinished {
                        scene: self.target.clone(),
                        fault: self.fault.take(),
                    });
                }
            }
        }
    }

    /// Waits only count frames that start inside them. The pad ticks itself
    /// since it also fills the bar on the frame it begins.
    fn tick_waits(&mut self, delta: Duration) {
        match &mut self.phase {
            Phase::PreWait(timer) | Phase::PostWait(timer) => {
                timer.tick(delta);
            }
            Phase::Loading { .. } => {
                self.load_time.tick(delta);
            }
            Phase::RestoreWait { waited, .. } => {
                waited.tick(delta);
                self.load_time.tick(delta);
            }
            _ => {}
        }
    }

    fn step(&mut self, frame: &mut Frame<'_>) -> Flow {
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);
        let (next, flow) = match phase {
            Phase::AwaitOverlay(op) => match frame.host.poll(op) {
                Ok(status) if status.done => (Phase::Announce, Flow::Continue),
                Ok(_) => (Phase::AwaitOverlay(op), Flow::Yield),
                Err(source) => self.fail(LoadFault::OverlayUnavailable {
                    scene: self.overlay.clone(),
                    source,
                }),
            },
            Phase::Announce => {
                info!("Loading scene {}", self.target);
                frame.view.status = format!("Loading {}...", self.target);
                frame.view.bar_min = frame.config.bar_min;
                frame.view.bar_max = frame.config.bar_max;
                frame.view.value = frame.config.bar_min;
                frame.view.visible = true;
                frame.pause.increment();
                self.paused = true;
                (Phase::PreWait(settle(frame)), Flow::Continue)
            }
            Phase::PreWait(timer) if !expired(&timer) => (Phase::PreWait(timer), Flow::Yield),
            Phase::PreWait(_) => {
                let pending = frame
                    .host
                    .active_scenes()
                    .into_iter()
                    .filter(|scene| *scene != self.overlay)
                    .collect();
                (
                    Phase::UnloadOthers {
                        pending,
                        current: None,
                    },
                    Flow::Continue,
                )
            }
            Phase::UnloadOthers { pending, current } => self.unload_others(frame, pending, current),
            Phase::Reclaim(op) => {
                let op = op.unwrap_or_else(|| frame.host.reclaim_unused_resources());
                match frame.host.poll(op) {
                    Ok(status) if status.done => {
                        frame.host.force_collect();
                        (Phase::BeginLoad, Flow::Continue)
                    }
                    Ok(_) => (Phase::Reclaim(Some(op)), Flow::Yield),
                    Err(source) => self.fail(LoadFault::Reclaim(source)),
                }
            }
            Phase::BeginLoad => {
                self.load_time.reset();
                match frame.host.load_scene(&self.target, false) {
                    Ok(op) => (
                        Phase::Loading {
                            op,
                            activation_allowed: false,
                        },
                        Flow::Continue,
                    ),
                    Err(source) => self.fail(LoadFault::Load {
                        scene: self.target.clone(),
                        source,
                    }),
                }
            }
            Phase::Loading {
                op,
                mut activation_allowed,
            } => match frame.host.poll(op) {
                Ok(status) if status.done => (self.after_load(frame.config), Flow::Continue),
                Ok(status) => {
                    let normalized = progress::normalized_load_progress(status.progress);
                    frame.view.value = progress::load_phase_value(
                        frame.config.bar_min,
                        frame.config.bar_max,
                        normalized,
                    );
                    if normalized >= 1.0 && !activation_allowed {
                        debug!("Allowing activation of {}", self.target);
                        frame.host.allow_activation(op);
                        activation_allowed = true;
                    }
                    (
                        Phase::Loading {
                            op,
                            activation_allowed,
                        },
                        Flow::Yield,
                    )
                }
                Err(source) => self.fail(LoadFault::Load {
                    scene: self.target.clone(),
                    source,
                }),
            },
            Phase::RestoreWait { waited, warned } => self.await_restore(frame, waited, warned),
            Phase::Pad(mut timer) if !expired(&timer) => {
                timer.tick(frame.delta);
                frame.view.value =
                    progress::pad_phase_value(frame.config.bar_max, timer.fraction());
                (Phase::Pad(timer), Flow::Yield)
            }
            Phase::Pad(_) => (Phase::PostWait(settle(frame)), Flow::Continue),
            Phase::PostWait(timer) if !expired(&timer) => (Phase::PostWait(timer), Flow::Yield),
            Phase::PostWait(_) => (Phase::Teardown, Flow::Continue),
            Phase::Teardown => {
                self.teardown(frame);
                (Phase::Finished, Flow::Finished)
            }
            Phase::Finished => (Phase::Finished, Flow::Finished),
        };
        self.phase = next;
        flow
    }

    fn unload_others(
        &mut self,
        frame: &mut Frame<'_>,
        mut pending: VecDeque<String>,
        current: Option<(String, OperationId)>,
    ) -> (Phase, Flow) {
        if let Some((scene, op)) = current {
            match frame.host.poll(op) {
                Ok(status) if status.done => debug!("Unloaded scene {scene}"),
                Ok(_) => {
                    return (
                        Phase::UnloadOthers {
                            pending,
                            current: Some((scene, op)),
                        },
                        Flow::Yield,
                    );
                }
                Err(source) => return self.fail(LoadFault::Unload { scene, source }),
            }
        }

        let Some(scene) = pending.pop_front() else {
            return (Phase::Reclaim(None), Flow::Continue);
        };
        debug!("Unloading scene {scene}");
        match frame.host.unload_scene(&scene) {
            Ok(op) => (
                Phase::UnloadOthers {
                    pending,
                    current: Some((scene, op)),
                },
                Flow::Continue,
            ),
            Err(source) => self.fail(LoadFault::Unload { scene, source }),
        }
    }

    fn after_load(&self, config: &LoaderConfig) -> Phase {
        if self.restore.is_some() {
            Phase::RestoreWait {
                waited: Stopwatch::new(),
                warned: false,
            }
        } else {
            self.pad(config)
        }
    }

    /// The pad only covers what is left of the minimum load time, counted
    /// from the moment the target load started.
    fn pad(&self, config: &LoaderConfig) -> Phase {
        let left = progress::pad_time_left(config.min_load_time(), self.load_time.elapsed());
        Phase::Pad(Timer::new(left, TimerMode::Once))
    }

    fn await_restore(
        &mut self,
        frame: &mut Frame<'_>,
        waited: Stopwatch,
        warned: bool,
    ) -> (Phase, Flow) {
        let state = self
            .restore
            .as_ref()
            .map_or(RestoreState::Restored, read_restore);
        match state {
            RestoreState::Restored => {
                debug!("Scene {} restored", self.target);
                (self.pad(frame.config), Flow::Continue)
            }
            RestoreState::Dropped => {
                warn!(
                    "Restore flag for {} was dropped while waiting on it",
                    self.target
                );
                self.fault = Some(LoadFault::RestoreFlagDropped);
                (self.pad(frame.config), Flow::Continue)
            }
            RestoreState::Pending => {
                let warned = if !warned && waited.elapsed() >= frame.config.restore_warn_time() {
                    warn!(
                        "Still waiting for {} to be restored after {:.1}s",
                        self.target,
                        waited.elapsed_secs()
                    );
                    true
                } else {
                    warned
                };
                (Phase::RestoreWait { waited, warned }, Flow::Yield)
            }
        }
    }

    fn teardown(&mut self, frame: &mut Frame<'_>) {
        let overlay_missing = matches!(self.fault, Some(LoadFault::OverlayUnavailable { .. }));
        if !overlay_missing {
            match frame.host.unload_scene(&self.overlay) {
                Ok(op) => self.overlay_unload = Some(op),
                Err(source) => {
                    let fault = LoadFault::OverlayUnload {
                        scene: self.overlay.clone(),
                        source,
                    };
                    report(&fault);
                }
            }
        }
        if self.paused {
            frame.pause.decrement();
            self.paused = false;
        }
        frame.view.status.clear();
        frame.view.visible = false;
        match &self.fault {
            Some(fault) if fault.is_fatal() => warn!("Gave up loading {}", self.target),
            _ => info!("Finished loading {}", self.target),
        }
    }

    fn fail(&mut self, fault: LoadFault) -> (Phase, Flow) {
        report(&fault);
        self.fault = Some(fault);
        (Phase::Teardown, Flow::Continue)
    }
}

fn settle(frame: &Frame<'_>) -> Timer {
    Timer::new(frame.config.settle_time(), TimerMode::Once)
}

/// A zero-length timer counts as expired before it is ever ticked.
fn expired(timer: &Timer) -> bool {
    timer.finished() || timer.duration().is_zero()
}

pub(crate) fn report(fault: &LoadFault) {
    match fault.source() {
        Some(source) => error!("{fault}: {source}"),
        None => error!("{fault}"),
    }
}
