//! Scene transitions behind a loading overlay.
//!
//! [`SceneLoader`] accepts one load request at a time, shows the overlay,
//! unloads whatever is active, loads the target scene with deferred
//! activation and reports progress through [`LoadingView`].

mod config;
mod error;
mod host;
mod overlay;
mod progress;
mod request;
mod sequence;

#[cfg(test)]
mod testing;

use std::time::Duration;

use bevy::prelude::*;

pub use config::{LoaderConfig, OVERLAY_SCENE};
pub use error::LoadFault;
pub use host::{HostError, OperationId, OperationStatus, SceneHost};
pub use overlay::{LoadingBarFill, LoadingOverlay, LoadingStatusLabel};
pub use progress::{
    HOST_PROGRESS_CEILING, LOAD_PHASE_SHARE, load_phase_value, normalized_load_progress,
    pad_phase_value, pad_time_left,
};
pub use request::{LoadRequest, RestoreFlag};
pub use sequence::Stage;

use sequence::{Frame, Sequence};

pub fn plugin(app: &mut App) {
    app.init_resource::<LoadingView>()
        .init_resource::<PauseCount>()
        .add_event::<SceneLoadFinished>()
        .add_observer(handle_load_request);

    app.add_systems(
        Update,
        (
            drive_scene_loader.run_if(resource_exists::<SceneLoader>),
            overlay::sync_overlay,
            overlay::update_overlay,
        )
            .chain(),
    );
}

/// Asks the [`SceneLoader`] to switch to `scene`.
///
/// Dropped when a transition is already running.
#[derive(Event, Debug, Clone)]
pub struct RequestSceneLoad {
    pub scene: String,
    pub restore: Option<RestoreFlag>,
}

impl RequestSceneLoad {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            restore: None,
        }
    }

    /// The transition will not complete before `restore` is raised.
    pub fn with_restore(scene: impl Into<String>, restore: RestoreFlag) -> Self {
        Self {
            scene: scene.into(),
            restore: Some(restore),
        }
    }
}

/// Sent once a transition has torn its overlay down.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SceneLoadFinished {
    pub scene: String,
    pub fault: Option<LoadFault>,
}

impl SceneLoadFinished {
    pub fn succeeded(&self) -> bool {
        self.fault.as_ref().is_none_or(|fault| !fault.is_fatal())
    }
}

/// What the loading overlay should currently show.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LoadingView {
    pub bar_min: f32,
    pub bar_max: f32,
    pub value: f32,
    pub status: String,
    pub visible: bool,
}

impl Default for LoadingView {
    fn default() -> Self {
        Self {
            bar_min: 0.0,
            bar_max: 1.0,
            value: 0.0,
            status: String::new(),
            visible: false,
        }
    }
}

impl LoadingView {
    /// Fill ratio of the bar in `[0, 1]`.
    pub fn fill(&self) -> f32 {
        progress::inverse_lerp(self.bar_min, self.bar_max, self.value)
    }
}

/// Number of parties currently suspending player input.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseCount(u32);

impl PauseCount {
    pub fn increment(&mut self) {
        self.0 += 1;
    }

    pub fn decrement(&mut self) {
        match self.0.checked_sub(1) {
            Some(count) => self.0 = count,
            None => warn!("Pause count decremented below zero"),
        }
    }

    pub fn count(&self) -> u32 {
        self.0
    }

    pub fn is_paused(&self) -> bool {
        self.0 > 0
    }
}

/// Run condition for input handling that must stay quiet during loads.
pub fn input_unpaused(pause: Res<PauseCount>) -> bool {
    !pause.is_paused()
}

/// Coordinates scene transitions on top of a [`SceneHost`].
#[derive(Resource)]
pub struct SceneLoader {
    config: LoaderConfig,
    host: Box<dyn SceneHost>,
    request: LoadRequest,
    sequence: Option<Sequence>,
    detached_unload: Option<OperationId>,
}

impl SceneLoader {
    pub fn new(config: LoaderConfig, host: impl SceneHost) -> Self {
        Self {
            config,
            host: Box::new(host),
            request: LoadRequest::default(),
            sequence: None,
            detached_unload: None,
        }
    }

    /// Starts a transition to `scene` unless one is already running.
    ///
    /// A supplied `restore` flag is lowered right away; the transition then
    /// waits for it to be raised again after the scene loaded. Returns
    /// whether the request was accepted.
    pub fn request_load(&mut self, scene: impl Into<String>, restore: Option<&RestoreFlag>) -> bool {
        let scene = scene.into();
        if !self.request.accept(scene.as_str(), restore) {
            debug!(
                "Dropping load of {scene}: already loading {}",
                self.request.target().unwrap_or_default()
            );
            return false;
        }

        let overlay = self.config.overlay_scene.clone();
        match self.host.load_scene(&overlay, true) {
            Ok(op) => {
                self.sequence = Some(Sequence::new(
                    scene,
                    overlay,
                    self.request.restore_handle(),
                    op,
                ));
                true
            }
            Err(source) => {
                sequence::report(&LoadFault::OverlayUnavailable {
                    scene: overlay,
                    source,
                });
                self.request.clear();
                false
            }
        }
    }

    /// Advances the running transition by one frame.
    pub fn tick(
        &mut self,
        delta: Duration,
        view: &mut LoadingView,
        pause: &mut PauseCount,
    ) -> Option<SceneLoadFinished> {
        self.host.tick(delta);
        self.poll_detached_unload();

        let sequence = self.sequence.as_mut()?;
        let mut frame = Frame {
            host: self.host.as_mut(),
            config: &self.config,
            view,
            pause,
            delta,
        };
        let finished = sequence.advance(&mut frame)?;

        if let Some(op) = sequence.take_overlay_unload() {
            self.detached_unload = Some(op);
        }
        self.sequence = None;
        self.request.clear();
        Some(finished)
    }

    pub fn is_loading(&self) -> bool {
        self.request.in_progress()
    }

    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    pub fn stage(&self) -> Option<Stage> {
        self.sequence.as_ref().map(Sequence::stage)
    }

    pub fn host(&self) -> &dyn SceneHost {
        self.host.as_ref()
    }

    fn poll_detached_unload(&mut self) {
        let Some(op) = self.detached_unload else {
            return;
        };
        match self.host.poll(op) {
            Ok(status) if status.done => {
                debug!("Unloaded overlay {}", self.config.overlay_scene);
                self.detached_unload = None;
            }
            Ok(_) => {}
            Err(source) => {
                sequence::report(&LoadFault::OverlayUnload {
                    scene: self.config.overlay_scene.clone(),
                    source,
                });
                self.detached_unload = None;
            }
        }
    }
}

fn handle_load_request(trigger: Trigger<RequestSceneLoad>, loader: Option<ResMut<SceneLoader>>) {
    let request = trigger.event();
    let Some(mut loader) = loader else {
        warn!("No scene loader to handle load of {}", request.scene);
        return;
    };
    if !loader.request_load(request.scene.as_str(), request.restore.as_ref()) {
        info!("Load of {} was not started", request.scene);
    }
}

fn drive_scene_loader(
    time: Res<Time>,
    mut loader: ResMut<SceneLoader>,
    mut view: ResMut<LoadingView>,
    mut pause: ResMut<PauseCount>,
    mut finished: EventWriter<SceneLoadFinished>,
) {
    if let Some(result) = loader.tick(time.delta(), &mut view, &mut pause) {
        finished.write(result);
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::ScriptedHost, *};

    const FRAME: Duration = Duration::from_millis(500);

    struct Harness {
        loader: SceneLoader,
        host: ScriptedHost,
        view: LoadingView,
        pause: PauseCount,
    }

    impl Harness {
        fn new(config: LoaderConfig, active: &[&str]) -> Self {
            let host = ScriptedHost::with_active(active);
            Self {
                loader: SceneLoader::new(config, host.clone()),
                host,
                view: LoadingView::default(),
                pause: PauseCount::default(),
            }
        }

        fn tick(&mut self) -> Option<SceneLoadFinished> {
            self.tick_by(FRAME)
        }

        fn tick_by(&mut self, delta: Duration) -> Option<SceneLoadFinished> {
            self.loader.tick(delta, &mut self.view, &mut self.pause)
        }

        /// Ticks until the transition finishes, recording the stage after
        /// every frame.
        fn run(&mut self, limit: usize) -> (SceneLoadFinished, Vec<Option<Stage>>) {
            let mut stages = Vec::new();
            for _ in 0..limit {
                let finished = self.tick();
                stages.push(self.loader.stage());
                if let Some(finished) = finished {
                    return (finished, stages);
                }
            }
            panic!("transition did not finish, stuck in {:?}", self.loader.stage());
        }
    }

    #[test]
    fn battle_transition_end_to_end() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu", "Hud"]);
        assert!(harness.loader.request_load("Battle", None));

        assert_eq!(harness.tick(), None);
        assert_eq!(harness.loader.stage(), Some(Stage::Loading));
        assert_eq!(harness.view.status, "Loading Battle...");
        assert!(harness.view.visible);
        assert!(harness.pause.is_paused());
        assert_eq!(harness.view.value, 0.0);

        harness.host.set_progress(0.45);
        assert_eq!(harness.tick(), None);
        assert!((harness.view.value - 0.4).abs() < 1e-6);

        harness.host.set_progress(0.9);
        assert_eq!(harness.tick(), None);
        assert_eq!(harness.view.value, 0.8);

        let finished = harness.tick().expect("transition finished");
        assert_eq!(
            finished,
            SceneLoadFinished {
                scene: "Battle".into(),
                fault: None,
            }
        );
        assert_eq!(
            harness.host.trace(),
            [
                "load LoadScene",
                "activate LoadScene",
                "unload Menu",
                "unload Hud",
                "reclaim",
                "collect",
                "load Battle",
                "allow Battle",
                "activate Battle",
                "unload LoadScene",
            ]
        );
        assert!(!harness.loader.is_loading());
        assert_eq!(harness.loader.request().target(), None);
        assert_eq!(harness.pause.count(), 0);
        assert!(harness.view.status.is_empty());
        assert!(!harness.view.visible);

        // The overlay unload is not awaited but still completes later.
        harness.tick();
        assert_eq!(harness.host.active_scenes(), ["Battle"]);
    }

    #[test]
    fn unloads_wait_for_each_other() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu", "Hud"]);
        harness.host.state().unload_polls = 2;
        harness.loader.request_load("Battle", None);

        harness.tick();
        assert_eq!(harness.loader.stage(), Some(Stage::UnloadingOthers));
        assert_eq!(harness.host.trace().last().unwrap(), "unload Menu");
        harness.tick();
        assert_eq!(harness.host.trace().last().unwrap(), "unload Menu");
        harness.tick();
        assert_eq!(harness.host.trace().last().unwrap(), "load Battle");
    }

    #[test]
    fn concurrent_request_is_dropped() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        assert!(harness.loader.request_load("Battle", None));
        assert!(!harness.loader.request_load("Tabletop", None));
        assert_eq!(harness.loader.request().target(), Some("Battle"));
        assert_eq!(harness.host.trace(), ["load LoadScene"]);
    }

    #[test]
    fn pad_is_skipped_when_load_took_long_enough() {
        let config = LoaderConfig {
            min_load_secs: 1.0,
            ..LoaderConfig::immediate()
        };
        let mut harness = Harness::new(config, &["Menu"]);
        harness.loader.request_load("Battle", None);

        harness.tick();
        harness.host.set_progress(0.3);
        harness.tick();
        harness.host.set_progress(0.9);
        harness.tick();
        // Completion lands 1.5s after the load started.
        let (finished, stages) = harness.run(1);
        assert!(finished.succeeded());
        assert!(!stages.contains(&Some(Stage::Padding)));
    }

    #[test]
    fn pad_fills_the_rest_of_the_bar() {
        let config = LoaderConfig {
            min_load_secs: 3.0,
            ..LoaderConfig::immediate()
        };
        let mut harness = Harness::new(config, &["Menu"]);
        harness.loader.request_load("Battle", None);
        harness.tick();
        harness.host.set_progress(0.9);
        harness.tick();

        let mut values = Vec::new();
        loop {
            let finished = harness.tick();
            if harness.loader.stage() == Some(Stage::Padding) {
                values.push(harness.view.value);
            }
            if finished.is_some() {
                break;
            }
        }
        // Load completed 1s in, leaving 2s of pad at 0.5s per frame.
        assert_eq!(values.len(), 4);
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*values.last().unwrap(), 1.0);
        assert_eq!(harness.view.value, 1.0);
    }

    #[test]
    fn waits_for_restore_before_finishing() {
        let flag = RestoreFlag::new();
        flag.mark_restored();
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        assert!(harness.loader.request_load("Tabletop", Some(&flag)));
        assert!(!flag.is_restored());

        harness.tick();
        harness.host.set_progress(0.9);
        harness.tick();
        for _ in 0..20 {
            assert_eq!(harness.tick(), None);
            assert_eq!(harness.loader.stage(), Some(Stage::AwaitingRestore));
            assert!(harness.view.value <= 0.8);
        }

        flag.mark_restored();
        let (finished, _) = harness.run(1);
        assert_eq!(finished.fault, None);
        assert!(!harness.loader.is_loading());
        assert!(!harness.loader.request().has_restore_handle());
    }

    #[test]
    fn dropped_restore_flag_does_not_stall() {
        let flag = RestoreFlag::new();
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        harness.loader.request_load("Tabletop", Some(&flag));
        harness.host.set_progress(0.9);
        harness.tick();
        harness.tick();
        harness.tick();
        assert_eq!(harness.loader.stage(), Some(Stage::AwaitingRestore));

        drop(flag);
        let (finished, _) = harness.run(1);
        assert_eq!(finished.fault, Some(LoadFault::RestoreFlagDropped));
        assert!(finished.succeeded());
    }

    #[test]
    fn warns_once_about_a_slow_restore() {
        let config = LoaderConfig {
            restore_warn_secs: 1.0,
            ..LoaderConfig::immediate()
        };
        let flag = RestoreFlag::new();
        let mut harness = Harness::new(config, &["Menu"]);
        harness.loader.request_load("Tabletop", Some(&flag));
        harness.host.set_progress(0.9);
        harness.tick();
        harness.tick();
        assert_eq!(harness.loader.stage(), Some(Stage::AwaitingRestore));

        let warned = |harness: &Harness| {
            harness
                .loader
                .sequence
                .as_ref()
                .is_some_and(Sequence::restore_warned)
        };
        harness.tick();
        assert!(!warned(&harness));
        harness.tick();
        assert!(warned(&harness));
        for _ in 0..10 {
            assert_eq!(harness.tick(), None);
            assert_eq!(harness.loader.stage(), Some(Stage::AwaitingRestore));
            assert!(warned(&harness));
        }

        flag.mark_restored();
        let (finished, _) = harness.run(1);
        assert_eq!(finished.fault, None);
    }

    #[test]
    fn finishes_after_a_week_long_restore() {
        let config = LoaderConfig {
            pre_post_wait_secs: 0.5,
            min_load_secs: 1.0,
            ..LoaderConfig::default()
        };
        let flag = RestoreFlag::new();
        let mut harness = Harness::new(config, &["Menu"]);
        harness.host.set_progress(0.9);
        harness.loader.request_load("Tabletop", Some(&flag));
        for _ in 0..4 {
            harness.tick();
        }
        assert_eq!(harness.loader.stage(), Some(Stage::AwaitingRestore));

        harness.tick_by(Duration::from_secs(7 * 24 * 60 * 60));
        flag.mark_restored();
        let frame = Duration::from_millis(16);
        let finished = (0..100).find_map(|_| harness.tick_by(frame));
        assert_eq!(finished.map(|finished| finished.fault), Some(None));
        assert!(!harness.loader.is_loading());
        assert_eq!(harness.pause.count(), 0);
    }

    #[test]
    fn failed_overlay_unload_is_reported_later() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        harness.host.state().failing_unloads.push(OVERLAY_SCENE.into());
        harness.loader.request_load("Battle", None);
        harness.host.set_progress(0.9);

        let (finished, _) = harness.run(3);
        assert_eq!(finished.fault, None);
        assert!(harness.loader.detached_unload.is_some());

        assert_eq!(harness.tick(), None);
        assert!(harness.loader.detached_unload.is_none());
        assert!(harness.host.active_scenes().contains(&OVERLAY_SCENE.to_string()));
        assert!(harness.loader.request_load("Title", None));
    }

    #[test]
    fn unknown_scene_fails_and_frees_the_loader() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        harness.host.state().unknown.push("Nowhere".into());
        harness.loader.request_load("Nowhere", None);

        let (finished, _) = harness.run(1);
        assert!(!finished.succeeded());
        assert!(matches!(
            finished.fault,
            Some(LoadFault::Load { ref scene, source: HostError::UnknownScene(_) }) if scene == "Nowhere"
        ));
        assert_eq!(harness.pause.count(), 0);
        assert!(!harness.view.visible);
        assert_eq!(harness.host.trace().last().unwrap(), "unload LoadScene");
        assert!(harness.loader.request_load("Battle", None));
    }

    #[test]
    fn refused_overlay_rejects_the_request() {
        let mut harness = Harness::new(LoaderConfig::immediate(), &["Menu"]);
        harness.host.state().refuse_overlay = true;
        assert!(!harness.loader.request_load("Battle", None));
        assert!(!harness.loader.is_loading());
        assert_eq!(harness.tick(), None);
    }

    #[test]
    fn settle_time_delays_teardown() {
        let config = LoaderConfig {
            pre_post_wait_secs: 1.0,
            min_load_secs: 0.0,
            ..LoaderConfig::default()
        };
        let mut harness = Harness::new(config, &["Menu"]);
        harness.host.set_progress(0.9);
        harness.loader.request_load("Battle", None);

        harness.tick();
        assert_eq!(harness.loader.stage(), Some(Stage::PreWait));
        harness.tick();
        assert_eq!(harness.loader.stage(), Some(Stage::PreWait));
        let (_, stages) = harness.run(10);
        assert!(stages.contains(&Some(Stage::PostWait)));
        assert_eq!(harness.host.active_scenes(), ["LoadScene", "Battle"]);
    }

    #[test]
    fn pause_count_never_underflows() {
        let mut pause = PauseCount::default();
        pause.increment();
        pause.decrement();
        pause.decrement();
        assert_eq!(pause.count(), 0);
        assert!(!pause.is_paused());
    }
}
