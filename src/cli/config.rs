use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::explorer::config::{ExplorerConfig, SettleDelays, default_blacklist};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "app-traverser",
    version,
    about = "Depth-bounded automatic exploration of Android app screens"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Device serial (default: the only connected device)
    #[arg(long, global = true)]
    pub serial: Option<String>,

    /// uiautomator2 server URL (default: forward a local port with adb)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Path to config file (default: app-traverser.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch an app and explore its screens depth-first
    Traverse {
        /// Package name (e.g. com.android.settings) or app name
        #[arg(long)]
        app: String,

        /// Output directory for screenshots, UI trees, trace and report
        #[arg(short, long)]
        out: Option<String>,

        /// Maximum traversal depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Text typed into text fields
        #[arg(long)]
        probe_text: Option<String>,

        /// Scroll-reveal attempts per level
        #[arg(long)]
        scroll_ceiling: Option<usize>,
    },

    /// Print the current window and its interactable elements without acting
    Inspect,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `app-traverser.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub traverse: TraverseConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraverseConfig {
    #[serde(default = "default_out")]
    pub out: String,

    #[serde(default = "default_three")]
    pub max_depth: usize,

    #[serde(default = "default_five")]
    pub scroll_attempt_ceiling: usize,

    #[serde(default = "default_probe_text")]
    pub probe_text: String,

    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub delays: SettleDelays,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            out: default_out(),
            max_depth: 3,
            scroll_attempt_ceiling: 5,
            probe_text: default_probe_text(),
            blacklist: default_blacklist(),
            delays: SettleDelays::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeviceConfig {
    pub serial: Option<String>,
    pub endpoint: Option<String>,
}

// Serde default helpers
fn default_out() -> String { "ui_traversal".to_string() }
fn default_three() -> usize { 3 }
fn default_five() -> usize { 5 }
fn default_probe_text() -> String { "test_input".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("app-traverser.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build an ExplorerConfig: CLI values win over the config file.
pub fn build_explorer_config(
    app: &str,
    max_depth: Option<usize>,
    scroll_ceiling: Option<usize>,
    probe_text: Option<&str>,
    file: &TraverseConfig,
) -> ExplorerConfig {
    ExplorerConfig {
        app_identifier: app.to_string(),
        max_depth: max_depth.unwrap_or(file.max_depth),
        scroll_attempt_ceiling: scroll_ceiling.unwrap_or(file.scroll_attempt_ceiling),
        probe_text: probe_text
            .map(str::to_string)
            .unwrap_or_else(|| file.probe_text.clone()),
        blacklist: file.blacklist.clone(),
        delays: file.delays.clone(),
        ..ExplorerConfig::default()
    }
}

/// Catalog settings for `inspect`: no target app, but the same blacklist and
/// filters a traversal would apply.
pub fn build_inspect_config(file: &TraverseConfig) -> ExplorerConfig {
    build_explorer_config("", None, None, None, file)
}
