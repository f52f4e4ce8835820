use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Traversal configuration
// ============================================================================

/// Fixed pauses after each kind of gesture, in milliseconds.
///
/// There is no wait-for-idle signal from the device; every gesture is
/// followed by one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleDelays {
    /// After an element interaction, before recursing (default 2000)
    #[serde(default = "default_after_action")]
    pub after_action_ms: u64,

    /// After each primitive gesture issued by the dispatcher (default 300)
    #[serde(default = "default_after_gesture")]
    pub after_gesture_ms: u64,

    /// After a scroll-reveal swipe (default 1500)
    #[serde(default = "default_after_scroll")]
    pub after_scroll_ms: u64,

    /// After a back press (default 1000)
    #[serde(default = "default_after_back")]
    pub after_back_ms: u64,

    /// After launching the target app (default 3000)
    #[serde(default = "default_after_launch")]
    pub after_launch_ms: u64,

    /// Between opening a spinner and picking an option (default 1000)
    #[serde(default = "default_spinner_open")]
    pub spinner_open_ms: u64,
}

impl SettleDelays {
    /// All delays zero; used against in-memory devices.
    pub fn none() -> Self {
        Self {
            after_action_ms: 0,
            after_gesture_ms: 0,
            after_scroll_ms: 0,
            after_back_ms: 0,
            after_launch_ms: 0,
            spinner_open_ms: 0,
        }
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_action_ms: default_after_action(),
            after_gesture_ms: default_after_gesture(),
            after_scroll_ms: default_after_scroll(),
            after_back_ms: default_after_back(),
            after_launch_ms: default_after_launch(),
            spinner_open_ms: default_spinner_open(),
        }
    }
}

/// Sleep for `ms` milliseconds; zero returns immediately.
pub fn settle(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Configuration for one traversal run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Package name (contains a `.`) or display name of the app to explore
    pub app_identifier: String,

    /// Deepest level `handle_level` recurses to (default 3)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Scroll-reveal attempts per level before giving up (default 5)
    #[serde(default = "default_scroll_ceiling")]
    pub scroll_attempt_ceiling: usize,

    /// Elements narrower or shorter than this many pixels are ignored (default 10)
    #[serde(default = "default_min_size")]
    pub min_element_size: i32,

    /// Resource ids of system chrome that is never interacted with
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    /// Text typed into every text field (default "test_input")
    #[serde(default = "default_probe_text")]
    pub probe_text: String,

    #[serde(default)]
    pub delays: SettleDelays,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            app_identifier: String::new(),
            max_depth: default_max_depth(),
            scroll_attempt_ceiling: default_scroll_ceiling(),
            min_element_size: default_min_size(),
            blacklist: default_blacklist(),
            probe_text: default_probe_text(),
            delays: SettleDelays::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn for_app(app_identifier: &str) -> Self {
        Self {
            app_identifier: app_identifier.to_string(),
            ..Self::default()
        }
    }
}

// Serde default helpers
fn default_max_depth() -> usize { 3 }
fn default_scroll_ceiling() -> usize { 5 }
fn default_min_size() -> i32 { 10 }
fn default_probe_text() -> String { "test_input".to_string() }
fn default_after_action() -> u64 { 2000 }
fn default_after_gesture() -> u64 { 300 }
fn default_after_scroll() -> u64 { 1500 }
fn default_after_back() -> u64 { 1000 }
fn default_after_launch() -> u64 { 3000 }
fn default_spinner_open() -> u64 { 1000 }

pub fn default_blacklist() -> Vec<String> {
    vec![
        "android:id/statusBarBackground".to_string(),
        "android:id/navigationBarBackground".to_string(),
        "android:id/action_bar_container".to_string(),
    ]
}
