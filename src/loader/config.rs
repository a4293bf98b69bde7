use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Default name of the scene hosting the loading overlay.
pub const OVERLAY_SCENE: &str = "LoadScene";

/// Tunables of a scene transition.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Settle time before tearing down and after loading, in seconds.
    pub pre_post_wait_secs: f32,
    /// Minimum time the progress bar takes to fill once loading starts.
    pub min_load_secs: f32,
    pub overlay_scene: String,
    pub bar_min: f32,
    pub bar_max: f32,
    /// Restore waits longer than this get a warning. They never time out.
    pub restore_warn_secs: f32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            pre_post_wait_secs: 0.5,
            min_load_secs: 1.0,
            overlay_scene: OVERLAY_SCENE.to_string(),
            bar_min: 0.0,
            bar_max: 1.0,
            restore_warn_secs: 10.0,
        }
    }
}

impl LoaderConfig {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn settle_time(&self) -> Duration {
        secs(self.pre_post_wait_secs)
    }

    pub fn min_load_time(&self) -> Duration {
        secs(self.min_load_secs)
    }

    pub fn restore_warn_time(&self) -> Duration {
        secs(self.restore_warn_secs)
    }

    /// Instant variant used by headless runs: no settle time, no padding.
    pub fn immediate() -> Self {
        Self {
            pre_post_wait_secs: 0.0,
            min_load_secs: 0.0,
            ..Self::default()
        }
    }
}

/// Negative or non-finite settings count as no time at all.
fn secs(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or_default()
}
