// SPDX-License-Identifier: GPL-3.0-only

//! Application state and screen navigation
//!
//! The shell starts in [`AppState::Initializing`] and moves to
//! [`AppState::Ready`] exactly once, when the permission gate finishes.
//! Only then is the route stack reachable.

use crate::app::permission::PermissionState;
use tracing::{debug, info};

/// Whether startup has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Permission gate still running
    Initializing,
    /// Screens are available; carries the gate's outcome
    Ready(PermissionState),
}

/// Navigation destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    TakingPhoto,
    ScanningBarcode,
    DetectingFace,
}

impl Route {
    /// Destinations reachable from the home screen, in menu order
    pub const DESTINATIONS: [Route; 3] = [
        Route::TakingPhoto,
        Route::ScanningBarcode,
        Route::DetectingFace,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Camera Showcase",
            Route::TakingPhoto => "Taking Photo",
            Route::ScanningBarcode => "Scanning Barcode",
            Route::DetectingFace => "Detecting Face",
        }
    }
}

/// Push-only route stack rooted at [`Route::Home`]
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }
}

impl Navigator {
    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Home)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, route: Route) {
        debug!(?route, "Navigating");
        self.stack.push(route);
    }

    /// Pop the current route; the root stays
    pub fn pop(&mut self) -> Option<Route> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }
}

/// What the shell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellView {
    /// "Loading App.." placeholder
    Loading,
    Screen(Route, PermissionState),
}

/// Root of the UI: app state plus the route stack
#[derive(Debug)]
pub struct NavigationShell {
    state: AppState,
    navigator: Navigator,
}

impl Default for NavigationShell {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationShell {
    pub fn new() -> Self {
        Self {
            state: AppState::Initializing,
            navigator: Navigator::default(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, AppState::Ready(_))
    }

    pub fn permission(&self) -> Option<PermissionState> {
        match self.state {
            AppState::Initializing => None,
            AppState::Ready(permission) => Some(permission),
        }
    }

    /// The single Initializing → Ready transition
    ///
    /// Returns false if the shell was already ready.
    pub fn finish_initialization(&mut self, permission: PermissionState) -> bool {
        if self.is_ready() {
            return false;
        }
        info!(granted = permission.granted, "Initialization finished");
        self.state = AppState::Ready(permission);
        true
    }

    pub fn current_route(&self) -> Route {
        self.navigator.current()
    }

    pub fn depth(&self) -> usize {
        self.navigator.depth()
    }

    /// Push a screen; ignored while initializing
    pub fn navigate(&mut self, route: Route) -> bool {
        if !self.is_ready() || route == Route::Home {
            return false;
        }
        self.navigator.push(route);
        true
    }

    pub fn back(&mut self) -> Option<Route> {
        self.navigator.pop()
    }

    pub fn view(&self) -> ShellView {
        match self.state {
            AppState::Initializing => ShellView::Loading,
            AppState::Ready(permission) => ShellView::Screen(self.current_route(), permission),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_until_initialized() {
        let mut shell = NavigationShell::new();
        assert_eq!(shell.view(), ShellView::Loading);
        assert!(!shell.navigate(Route::TakingPhoto));

        assert!(shell.finish_initialization(PermissionState::denied()));
        assert_eq!(
            shell.view(),
            ShellView::Screen(Route::Home, PermissionState::denied())
        );
    }

    #[test]
    fn test_initialization_happens_once() {
        let mut shell = NavigationShell::new();
        shell.finish_initialization(PermissionState::granted());
        assert!(!shell.finish_initialization(PermissionState::denied()));
        assert_eq!(shell.permission(), Some(PermissionState::granted()));
    }

    #[test]
    fn test_push_and_back() {
        let mut shell = NavigationShell::new();
        shell.finish_initialization(PermissionState::granted());
        assert!(shell.navigate(Route::ScanningBarcode));
        assert!(!shell.navigate(Route::Home));
        assert_eq!(shell.current_route(), Route::ScanningBarcode);
        assert_eq!(shell.back(), Some(Route::ScanningBarcode));
        assert_eq!(shell.back(), None);
        assert_eq!(shell.current_route(), Route::Home);
    }
}
