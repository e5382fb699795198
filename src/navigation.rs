//! Navigation side effects
//!
//! The session client never touches a browser. It reports where the user
//! should go through a [`Navigator`], and the embedding application decides
//! how to get there.

use std::fmt;
use std::sync::Mutex;
use tracing::info;

use crate::routing::Route;

/// Client-side push versus full reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Push,
    Hard,
}

pub trait Navigator: Send + Sync + fmt::Debug {
    fn navigate(&self, route: Route, mode: NavigationMode);
}

/// Keeps every navigation in order and logs it
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(Route, NavigationMode)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<(Route, NavigationMode)> {
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<(Route, NavigationMode)> {
        self.visits().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route, mode: NavigationMode) {
        info!(path = route.path(), ?mode, "navigate");
        self.visits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((route, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        assert!(navigator.last().is_none());

        navigator.navigate(Route::AdminDashboard, NavigationMode::Push);
        navigator.navigate(Route::Home, NavigationMode::Hard);

        assert_eq!(
            navigator.visits(),
            vec![
                (Route::AdminDashboard, NavigationMode::Push),
                (Route::Home, NavigationMode::Hard),
            ]
        );
        assert_eq!(navigator.last(), Some((Route::Home, NavigationMode::Hard)));
    }
}
