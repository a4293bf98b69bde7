use bevy::{input::common_conditions::input_just_pressed, prelude::*};
use scene_loader::{loader::input_unpaused, theme::widget};

use super::{BATTLE, SceneContent, back_to_title, back_to_title_on_key};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        back_to_title_on_key.run_if(
            input_just_pressed(KeyCode::Escape)
                .and(input_unpaused)
                .and(battle_active),
        ),
    );
}

pub(super) fn content() -> impl Bundle {
    (
        widget::ui_root("Battle Scene"),
        SceneContent(BATTLE),
        children![
            widget::header("Battle"),
            widget::button("Back to title", back_to_title),
        ],
    )
}

fn battle_active(contents: Query<&SceneContent>) -> bool {
    contents.iter().any(|content| content.0 == BATTLE)
}
