//! Demo scenes switched between by the loader.
//!
//! The simulated host only tracks scene names; this module spawns and
//! despawns the matching UI whenever the host's active list changes.

mod battle;
mod tabletop;
mod title;

use bevy::prelude::*;
use scene_loader::{
    PauseCount, RequestSceneLoad, SceneLoadFinished, SceneLoader, SimulatedHost, loader::OVERLAY_SCENE,
};

pub const TITLE: &str = "Title";
pub const BATTLE: &str = "Battle";
pub const TABLETOP: &str = "Tabletop";

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((title::plugin, battle::plugin, tabletop::plugin));
    app.add_systems(Update, (sync_scene_content, log_finished_loads));
}

pub(super) fn host() -> SimulatedHost {
    SimulatedHost::new()
        .with_scene(OVERLAY_SCENE, 0.0)
        .with_scene(TITLE, 0.3)
        .with_scene(BATTLE, 2.5)
        .with_scene(TABLETOP, 1.5)
        .with_unload_secs(0.2)
        .with_jitter(0.3)
        .with_active(TITLE)
}

/// Root of the UI belonging to one host scene.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SceneContent(pub &'static str);

fn sync_scene_content(
    mut commands: Commands,
    loader: Res<SceneLoader>,
    mut shown: Local<Vec<String>>,
    contents: Query<(Entity, &SceneContent)>,
) {
    let active = loader.host().active_scenes();
    if *shown == active {
        return;
    }

    for (entity, content) in &contents {
        if !active.iter().any(|scene| scene == content.0) {
            commands.entity(entity).despawn();
        }
    }
    for scene in active.iter().filter(|scene| !shown.contains(scene)) {
        match scene.as_str() {
            TITLE => {
                commands.spawn(title::content());
            }
            BATTLE => {
                commands.spawn(battle::content());
            }
            TABLETOP => {
                commands.spawn(tabletop::content());
            }
            _ => {}
        }
    }
    *shown = active;
}

fn log_finished_loads(mut finished: EventReader<SceneLoadFinished>) {
    for load in finished.read() {
        match &load.fault {
            None => info!("Now playing {}", load.scene),
            Some(fault) if load.succeeded() => warn!("Loaded {} with: {fault}", load.scene),
            Some(fault) => error!("Could not load {}: {fault}", load.scene),
        }
    }
}

fn back_to_title(_: Trigger<Pointer<Click>>, pause: Res<PauseCount>, mut commands: Commands) {
    if !pause.is_paused() {
        commands.trigger(RequestSceneLoad::new(TITLE));
    }
}

fn back_to_title_on_key(mut commands: Commands) {
    commands.trigger(RequestSceneLoad::new(TITLE));
}
