//! Mapping of raw host load progress onto the loading bar.
//!
//! Hosts report load progress over `[0, 0.9]`; the last tenth is reserved
//! for activation. The bar shows the load itself over its first 80% and the
//! minimum-duration pad over the remaining 20%.

use std::time::Duration;

/// Upper bound of the progress value a host reports before activation.
pub const HOST_PROGRESS_CEILING: f32 = 0.9;

/// Share of the bar covered while the scene is loading.
pub const LOAD_PHASE_SHARE: f32 = 0.8;

pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Position of `value` between `a` and `b`, clamped to `[0, 1]`.
///
/// Returns 0 for an empty range.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    clamp01((value - a) / (b - a))
}

/// Linear interpolation with `t` clamped to `[0, 1]`. Lands exactly on `b`
/// when `t` reaches 1.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = clamp01(t);
    if t >= 1.0 { b } else { a + (b - a) * t }
}

/// Raw host progress remapped into `[0, 1]`.
pub fn normalized_load_progress(raw: f32) -> f32 {
    if !raw.is_finite() {
        return 0.0;
    }
    inverse_lerp(0.0, HOST_PROGRESS_CEILING, raw)
}

/// Bar value while the scene is loading.
pub fn load_phase_value(bar_min: f32, bar_max: f32, normalized: f32) -> f32 {
    lerp(bar_min, bar_max * LOAD_PHASE_SHARE, normalized)
}

/// Bar value while padding out the minimum load time, `fraction` being how
/// much of the pad has passed.
pub fn pad_phase_value(bar_max: f32, fraction: f32) -> f32 {
    lerp(bar_max * LOAD_PHASE_SHARE, bar_max, fraction)
}

/// Time still needed to reach `min_load` after `elapsed` of loading.
pub fn pad_time_left(min_load: Duration, elapsed: Duration) -> Duration {
    min_load.saturating_sub(elapsed)
}
