//! Side-channel query: is the user already looking at the locations overview?

use std::sync::RwLock;

use locwatch_protocol::ViewAction;

pub trait ViewContext: Send + Sync {
    fn is_viewing_overview(&self) -> bool;
}

/// Fixed answer. The CLI has no navigation, so it never views the overview.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticView(pub bool);

impl ViewContext for StaticView {
    fn is_viewing_overview(&self) -> bool {
        self.0
    }
}

/// Tracks the current route. Viewing the overview means the path ends in
/// the overview path.
#[derive(Debug, Default)]
pub struct RouteView {
    path: RwLock<String>,
}

impl RouteView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(path.into()),
        }
    }

    pub fn navigate(&self, path: impl Into<String>) {
        let mut current = self.path.write().unwrap_or_else(|e| e.into_inner());
        *current = path.into();
    }
}

impl ViewContext for RouteView {
    fn is_viewing_overview(&self) -> bool {
        let current = self.path.read().unwrap_or_else(|e| e.into_inner());
        current.ends_with(ViewAction::OpenLocations.path())
    }
}
