use tracing::{info, warn};

use crate::device::accessor::{DeviceAccessor, Key, Window};
use crate::error::TraversalError;
use crate::explorer::config::{ExplorerConfig, SettleDelays, settle};
use crate::explorer::dispatcher::scroll_reveal;

/// Restores navigation context by relaunching the target app.
///
/// The scroll offset is approximated by replaying the number of reveal
/// swipes the level had performed; the exact path to the failed element is
/// not replayed.
pub struct RecoveryManager {
    app_identifier: String,
    delays: SettleDelays,
}

impl RecoveryManager {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            app_identifier: config.app_identifier.clone(),
            delays: config.delays.clone(),
        }
    }

    /// Relaunch and replay `scroll_count` reveal swipes. Returns the window
    /// reached; a mismatch with `expected` is logged, not raised.
    pub fn recover(
        &self,
        device: &mut dyn DeviceAccessor,
        expected: &Window,
        scroll_count: usize,
    ) -> Result<Window, TraversalError> {
        info!(expected = %expected, scroll_count, "recovering navigation context");

        let window = self.reset_to_main_window(device)?;
        for _ in 0..scroll_count {
            scroll_reveal(device, &self.delays)?;
        }

        let reached = if scroll_count > 0 { device.current_window()? } else { window };
        if reached != *expected {
            warn!(expected = %expected, reached = %reached, "recovery landed on a different window");
        }
        Ok(reached)
    }

    /// Stop everything, go home and launch the target app fresh.
    pub fn reset_to_main_window(
        &self,
        device: &mut dyn DeviceAccessor,
    ) -> Result<Window, TraversalError> {
        device.stop_all_apps()?;
        device.press_key(Key::Home)?;
        self.launch(device)?;
        device.current_window()
    }

    /// Launch the target app and wait for it to settle.
    pub fn launch(&self, device: &mut dyn DeviceAccessor) -> Result<bool, TraversalError> {
        let started = device.start_app(&self.app_identifier)?;
        if !started {
            warn!(app = %self.app_identifier, "could not start target app");
        }
        settle(self.delays.after_launch_ms);
        Ok(started)
    }
}
