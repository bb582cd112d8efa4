// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for config and cache directories
pub const APP_ID: &str = "camera-showcase";

/// Capture session timing
pub mod session {
    use super::Duration;

    /// Delay before a confirmed photo is cleared from the closed modal
    pub const RESULT_CLEAR_DELAY: Duration = Duration::from_millis(1000);
}

/// Transient notice timing
pub mod notice {
    use super::Duration;

    /// How long a notice stays on screen
    pub const DISPLAY_DURATION: Duration = Duration::from_millis(2500);
}

/// Virtual camera timing and geometry
pub mod virtual_camera {
    use super::Duration;

    /// Interval between generated frames (~30 fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);
    /// Size of generated placeholder frames
    pub const PLACEHOLDER_WIDTH: u32 = 320;
    pub const PLACEHOLDER_HEIGHT: u32 = 240;
    /// Capacity of the event channel; frames are dropped when it is full
    pub const EVENT_CHANNEL_CAPACITY: usize = 16;
}

/// Terminal front-end timing
pub mod terminal {
    use super::Duration;

    /// Input poll timeout; doubles as the redraw interval
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);
}

/// User-facing notice texts
pub mod messages {
    pub const FLASH_DISABLED: &str = "Flash disabled";
    pub const CAPTURE_FAILED: &str = "Capture failed, try again";
    pub const PERMISSION_GRANTED: &str = "Camera permission granted";
}
