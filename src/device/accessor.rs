use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TraversalError;
use crate::screen::screen_model::{Point, UiElement};

/// Foreground application identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub package: String,
    pub activity: String,
}

impl Window {
    pub fn new(package: &str, activity: &str) -> Self {
        Self {
            package: package.to_string(),
            activity: activity.to_string(),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.activity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Back,
    Home,
    Enter,
}

impl Key {
    pub fn name(&self) -> &'static str {
        match self {
            Key::Back => "back",
            Key::Home => "home",
            Key::Enter => "enter",
        }
    }
}

/// Structural predicate evaluated against the nodes of the current tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementQuery {
    Clickable,
    EnabledFocusable,
    LongClickable,
    /// Exact class name.
    Class(String),
    /// Class name containing the given fragment.
    ClassContains(String),
    /// Enabled, clickable node of the given class; used to pick entries out
    /// of a freshly opened overlay.
    EnabledClickableClass(String),
}

impl ElementQuery {
    pub fn class(name: &str) -> Self {
        ElementQuery::Class(name.to_string())
    }

    pub fn class_contains(fragment: &str) -> Self {
        ElementQuery::ClassContains(fragment.to_string())
    }

    pub fn matches(&self, element: &UiElement) -> bool {
        let flags = &element.flags;
        match self {
            ElementQuery::Clickable => flags.clickable,
            ElementQuery::EnabledFocusable => flags.enabled && flags.focusable,
            ElementQuery::LongClickable => flags.long_clickable,
            ElementQuery::Class(name) => element.class_name == *name,
            ElementQuery::ClassContains(fragment) => element.class_name.contains(fragment.as_str()),
            ElementQuery::EnabledClickableClass(name) => {
                flags.enabled && flags.clickable && element.class_name == *name
            }
        }
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementQuery::Clickable => write!(f, "//*[@clickable='true']"),
            ElementQuery::EnabledFocusable => {
                write!(f, "//*[@enabled='true' and @focusable='true']")
            }
            ElementQuery::LongClickable => write!(f, "//*[@long-clickable='true']"),
            ElementQuery::Class(name) => write!(f, "//{}", name),
            ElementQuery::ClassContains(fragment) => {
                write!(f, "//*[contains(@class, '{}')]", fragment)
            }
            ElementQuery::EnabledClickableClass(name) => {
                write!(f, "//{}[@enabled='true' and @clickable='true']", name)
            }
        }
    }
}

/// Everything the traversal needs from a connected device.
///
/// Implementations are driven strictly sequentially: one call in flight, and
/// element arguments are snapshots that the implementation must re-resolve
/// against the live tree (or act on by coordinates) at call time.
pub trait DeviceAccessor {
    /// Foreground package and activity. Fails with `DeviceUnavailable` when
    /// the connection is lost.
    fn current_window(&mut self) -> Result<Window, TraversalError>;

    /// Display size in pixels, `(width, height)`.
    fn window_size(&mut self) -> Result<(u32, u32), TraversalError>;

    /// Encoded screenshot (PNG).
    fn screenshot(&mut self) -> Result<Vec<u8>, TraversalError>;

    /// Raw hierarchy dump of the current screen.
    fn dump_hierarchy(&mut self) -> Result<String, TraversalError>;

    /// Nodes of the current tree matching `query`, in document order.
    fn query_elements(&mut self, query: &ElementQuery) -> Result<Vec<UiElement>, TraversalError>;

    fn tap(&mut self, element: &UiElement) -> Result<(), TraversalError>;

    fn long_press(&mut self, element: &UiElement) -> Result<(), TraversalError>;

    /// Replace the content of a text field.
    fn set_text(&mut self, element: &UiElement, text: &str) -> Result<(), TraversalError>;

    fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<(), TraversalError>;

    fn press_key(&mut self, key: Key) -> Result<(), TraversalError>;

    /// Launch an app by package or display name. `Ok(false)` when no such
    /// app could be started.
    fn start_app(&mut self, identifier: &str) -> Result<bool, TraversalError>;

    fn stop_all_apps(&mut self) -> Result<(), TraversalError>;
}
