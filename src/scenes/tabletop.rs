//! The tabletop scene. Its board state is restored after the scene loads,
//! so the loader is handed a restore flag to wait on.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};
use scene_loader::{
    PauseCount, RequestSceneLoad, RestoreFlag, SceneLoader, loader::input_unpaused, theme::widget,
};

use super::{SceneContent, TABLETOP, back_to_title, back_to_title_on_key};

/// How long restoring the board takes once the scene is active.
const RESTORE_SECS: f32 = 1.2;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            restore_board.run_if(resource_exists::<PendingRestore>),
            back_to_title_on_key.run_if(
                input_just_pressed(KeyCode::Escape)
                    .and(input_unpaused)
                    .and(tabletop_active),
            ),
        ),
    );
}

pub(super) fn content() -> impl Bundle {
    (
        widget::ui_root("Tabletop Scene"),
        SceneContent(TABLETOP),
        children![
            widget::header("Tabletop"),
            widget::button("Back to title", back_to_title),
        ],
    )
}

#[derive(Resource, Debug)]
struct PendingRestore {
    flag: RestoreFlag,
    timer: Timer,
}

pub(super) fn load_on_click(
    _: Trigger<Pointer<Click>>,
    pause: Res<PauseCount>,
    loader: Res<SceneLoader>,
    commands: Commands,
) {
    if !pause.is_paused() {
        request_tabletop(&loader, commands);
    }
}

pub(super) fn load_on_key(loader: Res<SceneLoader>, commands: Commands) {
    request_tabletop(&loader, commands);
}

/// The loader drops requests while busy, so the running load keeps its flag.
fn request_tabletop(loader: &SceneLoader, mut commands: Commands) {
    if loader.is_loading() {
        debug!("Ignoring tabletop request while a load is running");
        return;
    }
    let flag = RestoreFlag::new();
    commands.insert_resource(PendingRestore {
        flag: flag.clone(),
        timer: Timer::from_seconds(RESTORE_SECS, TimerMode::Once),
    });
    commands.trigger(RequestSceneLoad::with_restore(TABLETOP, flag));
}

fn restore_board(
    mut commands: Commands,
    time: Res<Time>,
    loader: Res<SceneLoader>,
    mut pending: ResMut<PendingRestore>,
) {
    if !loader.host().active_scenes().iter().any(|scene| scene == TABLETOP) {
        return;
    }
    if pending.timer.tick(time.delta()).just_finished() {
        info!("Tabletop board restored");
        pending.flag.mark_restored();
        commands.remove_resource::<PendingRestore>();
    }
}

fn tabletop_active(contents: Query<&SceneContent>) -> bool {
    contents.iter().any(|content| content.0 == TABLETOP)
}
