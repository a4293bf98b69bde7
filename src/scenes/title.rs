//! The title scene, offering both game scenes.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};
use scene_loader::{PauseCount, RequestSceneLoad, loader::input_unpaused, theme::widget};

use super::{BATTLE, SceneContent, TITLE, tabletop};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (
            load_battle_on_key.run_if(input_just_pressed(KeyCode::Digit1)),
            tabletop::load_on_key.run_if(input_just_pressed(KeyCode::Digit2)),
        )
            .run_if(input_unpaused.and(title_active)),
    );
}

pub(super) fn content() -> impl Bundle {
    (
        widget::ui_root("Title Scene"),
        SceneContent(TITLE),
        children![
            widget::header("Scene Loader"),
            widget::button("Battle", load_battle),
            widget::button("Tabletop", tabletop::load_on_click),
            widget::label("Press 1 or 2"),
        ],
    )
}

fn title_active(contents: Query<&SceneContent>) -> bool {
    contents.iter().any(|content| content.0 == TITLE)
}

fn load_battle(_: Trigger<Pointer<Click>>, pause: Res<PauseCount>, mut commands: Commands) {
    if !pause.is_paused() {
        commands.trigger(RequestSceneLoad::new(BATTLE));
    }
}

fn load_battle_on_key(mut commands: Commands) {
    commands.trigger(RequestSceneLoad::new(BATTLE));
}
