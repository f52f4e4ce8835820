use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::device::accessor::{DeviceAccessor, ElementQuery};
use crate::error::TraversalError;
use crate::explorer::config::{ExplorerConfig, SettleDelays, settle};
use crate::screen::screen_model::{ElementKind, Point, UiElement};

const SPINNER_OPTION_CLASS: &str = "android.widget.CheckedTextView";
const CONTAINER_SWIPE: Duration = Duration::from_millis(400);
const REVEAL_SWIPE: Duration = Duration::from_millis(500);

/// What the dispatcher does with an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Interaction {
    Tap,
    EnterText(String),
    Toggle { was_checked: bool },
    PickFirstOption,
    ScrollInside,
    LongPress,
    Skip,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interaction::Tap => write!(f, "tap"),
            Interaction::EnterText(text) => write!(f, "enter_text({})", text),
            Interaction::Toggle { was_checked } => {
                write!(f, "toggle({} -> {})", was_checked, !was_checked)
            }
            Interaction::PickFirstOption => write!(f, "pick_first_option"),
            Interaction::ScrollInside => write!(f, "scroll_inside"),
            Interaction::LongPress => write!(f, "long_press"),
            Interaction::Skip => write!(f, "skip"),
        }
    }
}

/// Dispatch table from element kind and capabilities to an interaction.
pub fn plan_interaction(element: &UiElement, probe_text: &str) -> Interaction {
    match element.kind {
        ElementKind::Button => Interaction::Tap,
        ElementKind::TextField => Interaction::EnterText(probe_text.to_string()),
        ElementKind::Checkbox | ElementKind::Radio | ElementKind::Switch => Interaction::Toggle {
            was_checked: element.flags.checked,
        },
        ElementKind::Spinner => Interaction::PickFirstOption,
        ElementKind::ScrollContainer => Interaction::ScrollInside,
        ElementKind::Generic if element.flags.clickable => Interaction::Tap,
        ElementKind::Generic if element.flags.long_clickable => Interaction::LongPress,
        ElementKind::Generic => Interaction::Skip,
    }
}

pub struct ActionDispatcher {
    probe_text: String,
    delays: SettleDelays,
}

impl ActionDispatcher {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            probe_text: config.probe_text.clone(),
            delays: config.delays.clone(),
        }
    }

    /// Perform the interaction the element's kind calls for. No retries and
    /// no recovery: faults go straight back to the caller.
    pub fn operate(
        &self,
        device: &mut dyn DeviceAccessor,
        element: &UiElement,
    ) -> Result<Interaction, TraversalError> {
        let interaction = plan_interaction(element, &self.probe_text);
        info!(element = element.label(), kind = ?element.kind, %interaction, "operating element");

        match &interaction {
            Interaction::Tap | Interaction::Toggle { .. } => {
                device.tap(element)?;
                settle(self.delays.after_gesture_ms);
            }
            Interaction::EnterText(text) => {
                device.tap(element)?;
                settle(self.delays.after_gesture_ms);
                device.set_text(element, text)?;
                settle(self.delays.after_gesture_ms);
            }
            Interaction::PickFirstOption => {
                self.operate_spinner(device, element)?;
            }
            Interaction::ScrollInside => {
                let from = element.bounds.point_at_height(0.8);
                let to = element.bounds.point_at_height(0.2);
                device.swipe(from, to, CONTAINER_SWIPE)?;
                settle(self.delays.after_gesture_ms);
            }
            Interaction::LongPress => {
                device.long_press(element)?;
                settle(self.delays.after_gesture_ms);
            }
            Interaction::Skip => debug!(element = element.label(), "nothing to do"),
        }

        Ok(interaction)
    }

    fn operate_spinner(
        &self,
        device: &mut dyn DeviceAccessor,
        spinner: &UiElement,
    ) -> Result<(), TraversalError> {
        device.tap(spinner)?;
        settle(self.delays.spinner_open_ms);

        let options = device.query_elements(&ElementQuery::EnabledClickableClass(
            SPINNER_OPTION_CLASS.to_string(),
        ))?;

        match options.first() {
            Some(option) => {
                debug!(option = option.label(), "picking spinner option");
                device.tap(option)?;
                settle(self.delays.after_gesture_ms);
            }
            None => debug!(spinner = spinner.label(), "spinner opened without selectable options"),
        }
        Ok(())
    }

    /// Swipe the whole screen from 80% to 20% of its height to surface
    /// off-screen content.
    pub fn scroll_reveal(&self, device: &mut dyn DeviceAccessor) -> Result<(), TraversalError> {
        scroll_reveal(device, &self.delays)
    }
}

pub fn scroll_reveal(
    device: &mut dyn DeviceAccessor,
    delays: &SettleDelays,
) -> Result<(), TraversalError> {
    let (width, height) = device.window_size()?;
    let x = (width / 2) as i32;
    let from = Point::new(x, (height as f32 * 0.8) as i32);
    let to = Point::new(x, (height as f32 * 0.2) as i32);
    device.swipe(from, to, REVEAL_SWIPE)?;
    settle(delays.after_scroll_ms);
    Ok(())
}
