use tracing::{debug, info, warn};

use crate::device::accessor::{DeviceAccessor, Key, Window};
use crate::error::TraversalError;
use crate::explorer::catalog::{DiscoveredElement, ElementCatalog};
use crate::explorer::config::{ExplorerConfig, settle};
use crate::explorer::dispatcher::{ActionDispatcher, Interaction};
use crate::explorer::recovery::RecoveryManager;
use crate::explorer::report::TraversalReport;
use crate::record::recorder::{NoopRecorder, Recorder};
use crate::state::identity::page_signature;
use crate::state::state_model::{LevelState, TraversalPhase, VisitedSet};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Outcome, TraceEvent};

// ============================================================================
// Traversal engine
// ============================================================================

/// Depth-first explorer of a live app.
///
/// Owns the device connection and the visited set for the whole run. Each
/// level is explored by discovering the interactable elements of the current
/// screen, operating every one not seen before, recursing into whatever
/// screen resulted, and then scrolling to reveal more until the page stops
/// changing or the scroll ceiling is hit.
pub struct Traverser<D: DeviceAccessor> {
    device: D,
    config: ExplorerConfig,
    catalog: ElementCatalog,
    dispatcher: ActionDispatcher,
    recovery: RecoveryManager,
    visited: VisitedSet,
    phase: TraversalPhase,
    recorder: Box<dyn Recorder>,
    tracer: TraceLogger,
    report: TraversalReport,
    main_window: Option<Window>,
    step: u64,
}

impl<D: DeviceAccessor> Traverser<D> {
    pub fn new(device: D, config: ExplorerConfig) -> Self {
        Self {
            catalog: ElementCatalog::new(&config),
            dispatcher: ActionDispatcher::new(&config),
            recovery: RecoveryManager::new(&config),
            report: TraversalReport::new(&config.app_identifier, config.max_depth),
            device,
            config,
            visited: VisitedSet::new(),
            phase: TraversalPhase::Idle,
            recorder: Box::new(NoopRecorder),
            tracer: TraceLogger::disabled(),
            main_window: None,
            step: 0,
        }
    }

    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn phase(&self) -> &TraversalPhase {
        &self.phase
    }

    pub fn report(&self) -> &TraversalReport {
        &self.report
    }

    pub fn main_window(&self) -> Option<&Window> {
        self.main_window.as_ref()
    }

    /// Launch the target app and remember the window it opens on.
    pub fn start_main_window(&mut self) -> Result<Window, TraversalError> {
        self.recovery.launch(&mut self.device)?;
        let window = self.device.current_window()?;
        info!(window = %window, "main window");
        self.main_window = Some(window.clone());
        Ok(window)
    }

    /// Full run: launch, explore from depth 1, then return to the main
    /// window. Only a lost device connection ends the run early.
    pub fn run(&mut self) -> Result<TraversalReport, TraversalError> {
        let main_window = self.start_main_window()?;

        match self.handle_level(1) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(error = %e, "traversal ended early"),
        }

        let mut final_window = self.device.current_window()?;
        if final_window != main_window {
            info!(current = %final_window, main = %main_window, "returning to main window");
            final_window = self.recovery.reset_to_main_window(&mut self.device)?;
        }

        self.phase = TraversalPhase::Exhausted;
        self.report.visited = self.visited.iter().cloned().collect();
        self.report.final_window = Some(final_window);
        info!("{}", self.report.summary());
        Ok(self.report.clone())
    }

    /// Explore the screen currently shown at `depth`.
    pub fn handle_level(&mut self, depth: usize) -> Result<(), TraversalError> {
        self.enter_level(depth);
        let mut level = LevelState::new(depth);

        loop {
            let before = page_signature(&mut self.device)?;
            self.record(&format!("level{}_{}", depth, before));

            let elements = self
                .catalog
                .discover_interactable_elements(&mut self.device)?;
            if elements.is_empty() {
                debug!(depth, page = %before, "no interactable elements on screen");
            }

            for discovered in &elements {
                if self.visited.contains(&discovered.signature) {
                    debug!(signature = %discovered.signature, "already operated, skipping");
                    continue;
                }
                self.visited.insert(discovered.signature.clone());
                self.attempt(discovered, &mut level)?;
            }

            match self.dispatcher.scroll_reveal(&mut self.device) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(depth, error = %e, "scroll-reveal failed"),
            }
            level.scroll_attempts += 1;

            let after = page_signature(&mut self.device)?;
            if after == before {
                debug!(depth, page = %after, "page unchanged after scrolling, level exhausted");
                break;
            }
            if level.scroll_attempts >= self.config.scroll_attempt_ceiling {
                debug!(depth, attempts = level.scroll_attempts, "scroll ceiling reached");
                break;
            }
        }

        self.leave_level(depth);
        Ok(())
    }

    /// Operate one element with per-element isolation: anything short of a
    /// lost device is logged, recovered from, and swallowed.
    fn attempt(
        &mut self,
        discovered: &DiscoveredElement,
        level: &mut LevelState,
    ) -> Result<(), TraversalError> {
        let event = TraceEvent::now(
            self.step,
            level.depth,
            level.scroll_attempts,
            &discovered.signature,
        )
        .with_kind(discovered.element.kind);
        self.step += 1;
        self.report.interactions_attempted += 1;

        let error = match self.interact(discovered, level) {
            Ok((interaction, after)) => {
                self.tracer.log(
                    &event
                        .with_interaction(&interaction)
                        .with_windows(level.window_before.as_ref(), Some(&after))
                        .with_outcome(Outcome::Ok),
                );
                return Ok(());
            }
            Err(e) => e,
        };

        let outcome = match &error {
            TraversalError::NavigationDrift { .. } => {
                self.report.drifts += 1;
                Outcome::Drifted
            }
            _ => {
                self.report.interactions_failed += 1;
                Outcome::Failed
            }
        };
        self.tracer.log(
            &event
                .with_windows(level.window_before.as_ref(), None)
                .with_outcome(outcome)
                .with_error(&error),
        );

        if error.is_fatal() {
            return Err(error);
        }
        warn!(element = discovered.element.label(), error = %error, "element failed");

        let expected = level
            .window_before
            .clone()
            .or_else(|| self.main_window.clone())
            .unwrap_or_else(|| Window::new(&self.config.app_identifier, "unknown"));

        match self
            .recovery
            .recover(&mut self.device, &expected, level.scroll_attempts)
        {
            Ok(_) => self.report.recoveries += 1,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(error = %e, "recovery failed"),
        }
        Ok(())
    }

    fn interact(
        &mut self,
        discovered: &DiscoveredElement,
        level: &mut LevelState,
    ) -> Result<(Interaction, Window), TraversalError> {
        level.window_before = None;
        let before = self.device.current_window()?;
        level.window_before = Some(before.clone());

        let interaction = self
            .dispatcher
            .operate(&mut self.device, &discovered.element)?;
        settle(self.config.delays.after_action_ms);
        self.record(&discovered.signature.to_string());

        if level.depth < self.config.max_depth {
            self.handle_level(level.depth + 1)?;
        }

        let mut after = self.device.current_window()?;
        if after != before {
            debug!(from = %before, to = %after, "window changed, pressing back");
            self.device.press_key(Key::Back)?;
            settle(self.config.delays.after_back_ms);

            after = self.device.current_window()?;
            if after != before {
                return Err(TraversalError::NavigationDrift {
                    expected: before,
                    actual: after,
                });
            }
        }

        Ok((interaction, after))
    }

    fn enter_level(&mut self, depth: usize) {
        info!(depth, "{} entering depth {} {}", "=".repeat(20), depth, "=".repeat(20));
        self.phase = TraversalPhase::AtLevel(depth);
        self.report.levels_entered += 1;
        self.report.deepest_level = self.report.deepest_level.max(depth);
    }

    fn leave_level(&mut self, depth: usize) {
        self.phase = if depth <= 1 {
            TraversalPhase::Exhausted
        } else {
            TraversalPhase::AtLevel(depth - 1)
        };
    }

    fn record(&mut self, prefix: &str) {
        match self.recorder.record(&mut self.device, prefix) {
            Ok(Some(artifacts)) => debug!(
                screenshot = %artifacts.screenshot.display(),
                ui_tree = %artifacts.ui_tree.display(),
                "recorded"
            ),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to record screen state"),
        }
    }
}
