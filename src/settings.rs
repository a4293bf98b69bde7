//! Loader tunables, persisted as RON in the user's config directory.

use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;
use bevy_persistent::prelude::*;
use scene_loader::LoaderConfig;

pub(super) fn plugin(app: &mut App) {
    match persistent_config() {
        Ok(config) => {
            app.insert_resource(config);
        }
        Err(err) => warn!("Using default loader settings: {err:#}"),
    }
}

/// The persisted settings if they could be read, the defaults otherwise.
pub(super) fn loader_config(world: &World) -> LoaderConfig {
    world
        .get_resource::<Persistent<LoaderConfig>>()
        .map(|config| config.get().clone())
        .unwrap_or_default()
}

fn config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("no config directory on this platform")?
        .join("scene_loader");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    Ok(dir.join("loader.ron"))
}

fn persistent_config() -> anyhow::Result<Persistent<LoaderConfig>> {
    let path = config_path()?;
    Persistent::<LoaderConfig>::builder()
        .name("loader settings")
        .format(StorageFormat::Ron)
        .path(path.clone())
        .default(LoaderConfig::default())
        .build()
        .with_context(|| format!("failed to load {}", path.display()))
}
