//! The loading overlay UI, mirroring [`LoadingView`].

use bevy::prelude::*;

use super::LoadingView;
use crate::theme::{palette::OVERLAY_BACKGROUND, widget};

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LoadingOverlay;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LoadingStatusLabel;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LoadingBarFill;

pub(super) fn sync_overlay(
    mut commands: Commands,
    view: Res<LoadingView>,
    overlays: Query<Entity, With<LoadingOverlay>>,
) {
    if view.visible && overlays.is_empty() {
        commands.spawn((
            widget::ui_root("Loading Overlay"),
            LoadingOverlay,
            GlobalZIndex(10),
            BackgroundColor(OVERLAY_BACKGROUND),
            children![
                (widget::label(view.status.clone()), LoadingStatusLabel),
                widget::progress_bar(LoadingBarFill),
            ],
        ));
    } else if !view.visible {
        for overlay in &overlays {
            commands.entity(overlay).despawn();
        }
    }
}

pub(super) fn update_overlay(
    view: Res<LoadingView>,
    mut labels: Query<&mut Text, With<LoadingStatusLabel>>,
    mut fills: Query<&mut Node, With<LoadingBarFill>>,
) {
    for mut label in &mut labels {
        if label.0 != view.status {
            label.0.clone_from(&view.status);
        }
    }
    let width = Val::Percent(view.fill() * 100.0);
    for mut fill in &mut fills {
        fill.width = width;
    }
}
