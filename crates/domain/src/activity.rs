//! User interaction event classes observed by the idle monitor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class of user interaction that counts as session activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Pointer movement.
    PointerMove,
    /// Key press.
    KeyPress,
    /// Scrolling.
    Scroll,
    /// Touch start.
    Touch,
    /// Click.
    Click,
    /// The surface became visible again.
    VisibilityRegain,
}

impl ActivityKind {
    /// Every activity class the monitor listens to.
    pub const ALL: [Self; 6] = [
        Self::PointerMove,
        Self::KeyPress,
        Self::Scroll,
        Self::Touch,
        Self::Click,
        Self::VisibilityRegain,
    ];

    /// Returns the event name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerMove => "pointer_move",
            Self::KeyPress => "key_press",
            Self::Scroll => "scroll",
            Self::Touch => "touch",
            Self::Click => "click",
            Self::VisibilityRegain => "visibility_regain",
        }
    }

    /// High-frequency events that benefit from coalescing.
    #[must_use]
    pub const fn is_high_frequency(self) -> bool {
        matches!(self, Self::PointerMove | Self::Scroll)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
