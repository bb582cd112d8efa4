// SPDX-License-Identifier: GPL-3.0-only

//! Application logic shared by every front-end
//!
//! # Architecture
//!
//! - `navigation`: App state (`Initializing`/`Ready`) and the route stack
//! - `permission`: One-shot permission gate run at startup
//! - `screens`: Leaf screens, each hosting one capture session
//! - `session`: Capture session state machine
//! - `detection`: What drives a session (shutter, code scanner, face trigger)
//! - `driver`: Executes session commands on the tokio runtime
//! - `notice`: Transient user notices
//! - `frame_processor`: Frame analysis used by camera streams
//!
//! # Main Types
//!
//! - `CaptureSession`: Pure `update(message) -> commands` state machine
//! - `SessionDriver`: Runs the commands and feeds results back
//! - `NavigationShell`: Gates the screens behind initialization

pub mod detection;
pub mod driver;
pub mod frame_processor;
pub mod navigation;
pub mod notice;
pub mod permission;
pub mod screens;
pub mod session;

pub use detection::DetectionSource;
pub use driver::{DriverEvent, HeadlessActions, SessionDriver};
pub use navigation::{AppState, NavigationShell, Route, ShellView};
pub use notice::{Notice, NoticeLevel, NoticeQueue};
pub use permission::{PermissionGate, PermissionOutcome, PermissionState};
pub use screens::{CaptureScreen, ScreenView};
pub use session::{
    CaptureSession, SessionCommand, SessionConfig, SessionMessage, SessionOutput, SessionPhase,
};
