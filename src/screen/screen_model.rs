use serde::{Deserialize, Serialize};

use crate::screen::classifier::classify_class_name;

/// Pixel rectangle of a node, as reported by the hierarchy dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.left + self.right) / 2,
            y: (self.top + self.bottom) / 2,
        }
    }

    /// Point at the horizontal centre, `fraction` of the way down the rectangle.
    pub fn point_at_height(&self, fraction: f32) -> Point {
        Point {
            x: (self.left + self.right) / 2,
            y: self.top + (self.height() as f32 * fraction) as i32,
        }
    }

    /// Manhattan distance between the top-left corners; used to pick the
    /// closest live node when re-resolving a snapshot.
    pub fn distance(&self, other: &Bounds) -> i32 {
        (self.left - other.left).abs() + (self.top - other.top).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Closed set of element categories the dispatcher knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Button,
    TextField,
    Checkbox,
    Radio,
    Switch,
    Spinner,
    ScrollContainer,
    Generic,
}

/// Capability flags carried by every node of the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub clickable: bool,
    pub long_clickable: bool,
    pub focusable: bool,
    pub enabled: bool,
    pub checked: bool,
    pub scrollable: bool,
}

/// Value snapshot of one node of the UI tree.
///
/// Only meaningful for the tree it was read from: any interaction may
/// refresh the screen, after which the snapshot must be discarded and the
/// screen queried again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    pub kind: ElementKind,
    pub class_name: String,
    pub resource_id: Option<String>,
    pub text: Option<String>,
    pub description: Option<String>,
    pub bounds: Bounds,
    pub flags: Capabilities,
}

impl UiElement {
    /// Build a snapshot for `class_name`, classifying it once. Flags default
    /// to enabled and nothing else.
    pub fn new(class_name: &str, bounds: Bounds) -> Self {
        Self::with_flags(
            class_name,
            bounds,
            Capabilities {
                enabled: true,
                ..Capabilities::default()
            },
        )
    }

    pub fn with_flags(class_name: &str, bounds: Bounds, flags: Capabilities) -> Self {
        Self {
            kind: classify_class_name(class_name),
            class_name: class_name.to_string(),
            resource_id: None,
            text: None,
            description: None,
            bounds,
            flags,
        }
    }

    pub fn resource_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn clickable(mut self) -> Self {
        self.flags.clickable = true;
        self
    }

    pub fn long_clickable(mut self) -> Self {
        self.flags.long_clickable = true;
        self
    }

    pub fn focusable(mut self) -> Self {
        self.flags.focusable = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.flags.enabled = false;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.flags.checked = checked;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.flags.scrollable = true;
        self
    }

    /// Short label for logs: resource id, else text, else description, else class.
    pub fn label(&self) -> &str {
        [&self.resource_id, &self.text, &self.description]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(&self.class_name)
    }
}
