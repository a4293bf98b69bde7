use bevy::prelude::*;

/// #ddd369
pub const LABEL_TEXT: Color = Color::srgb(0.867, 0.827, 0.412);

/// #fcfbcc
pub const HEADER_TEXT: Color = Color::srgb(0.988, 0.984, 0.800);

/// #ececec
pub const BUTTON_TEXT: Color = Color::srgb(0.925, 0.925, 0.925);

/// #4666bf
pub const BUTTON_BACKGROUND: Color = Color::srgb(0.275, 0.400, 0.750);
/// #6299d1
pub const BUTTON_HOVERED_BACKGROUND: Color = Color::srgb(0.384, 0.600, 0.820);
/// #3d4999
pub const BUTTON_PRESSED_BACKGROUND: Color = Color::srgb(0.239, 0.286, 0.600);

/// #1a1a1d
pub const CLEAR_COLOR: Color = Color::srgb(0.102, 0.102, 0.114);

/// #1a1a1d at 97%, so the scenes swapping underneath stay hidden.
pub const OVERLAY_BACKGROUND: Color = Color::srgba(0.102, 0.102, 0.114, 0.97);

/// #3b1c32
pub const BAR_TRACK: Color = Color::srgb(0.231, 0.110, 0.196);

/// #a64d79
pub const BAR_FILL: Color = Color::srgb(0.651, 0.302, 0.475);
