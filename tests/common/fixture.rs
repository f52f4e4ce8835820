use std::collections::HashMap;
use std::time::Duration;

use app_traverser::device::accessor::{DeviceAccessor, ElementQuery, Key, Window};
use app_traverser::error::TraversalError;
use app_traverser::explorer::config::{ExplorerConfig, SettleDelays};
use app_traverser::screen::screen_model::{Bounds, Point, UiElement};
use app_traverser::state::identity::element_identifier;

pub const APP: &str = "com.example.app";
pub const MAIN_ACTIVITY: &str = ".MainActivity";
pub const LAUNCHER: &str = "com.android.launcher3";
pub const SCREEN: (u32, u32) = (1080, 2400);

/// What happens when a fixture element is tapped.
#[derive(Debug, Clone)]
pub enum TapEffect {
    None,
    Navigate(Window),
    Toggle,
    Fail(String),
    Disconnect,
    OpenOverlay(Vec<UiElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Tap(String),
    LongPress(String),
    SetText(String, String),
    Swipe { from: Point, to: Point },
    Key(Key),
    StartApp(String),
    StopAll,
}

#[derive(Debug, Clone)]
pub struct Screen {
    pub window: Window,
    pub elements: Vec<(UiElement, TapEffect)>,
    pub back_blocked: bool,
    pub on_scroll: Option<Window>,
}

impl Screen {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            elements: vec![],
            back_blocked: false,
            on_scroll: None,
        }
    }

    pub fn element(self, element: UiElement) -> Self {
        self.element_with(element, TapEffect::None)
    }

    pub fn element_with(mut self, element: UiElement, effect: TapEffect) -> Self {
        self.elements.push((element, effect));
        self
    }

    pub fn back_blocked(mut self) -> Self {
        self.back_blocked = true;
        self
    }

    /// A reveal swipe on this screen moves to `window`.
    pub fn on_scroll(mut self, window: Window) -> Self {
        self.on_scroll = Some(window);
        self
    }
}

/// Scripted in-memory device: a set of screens keyed by window, a back
/// stack, and a log of every gesture received.
pub struct FixtureDevice {
    screens: HashMap<Window, Screen>,
    main: Window,
    launcher: Window,
    current: Window,
    stack: Vec<Window>,
    overlay: Vec<UiElement>,
    disconnected: bool,
    failing_queries: Vec<ElementQuery>,
    pub gestures: Vec<Gesture>,
}

impl FixtureDevice {
    pub fn new() -> Self {
        let launcher = Window::new(LAUNCHER, ".Launcher");
        Self {
            screens: HashMap::new(),
            main: main_window(),
            current: launcher.clone(),
            launcher,
            stack: vec![],
            overlay: vec![],
            disconnected: false,
            failing_queries: vec![],
            gestures: vec![],
        }
    }

    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.screens.insert(screen.window.clone(), screen);
        self
    }

    pub fn failing_query(mut self, query: ElementQuery) -> Self {
        self.failing_queries.push(query);
        self
    }

    /// Start on the main window instead of the launcher.
    pub fn opened(mut self) -> Self {
        self.current = self.main.clone();
        self
    }

    pub fn window(&self) -> &Window {
        &self.current
    }

    pub fn navigate(&mut self, window: Window) {
        self.stack.push(std::mem::replace(&mut self.current, window));
    }

    /// Live state of an element on any screen, by identifier.
    pub fn element(&self, id: &str) -> Option<&UiElement> {
        self.screens
            .values()
            .flat_map(|s| s.elements.iter().map(|(e, _)| e))
            .find(|e| element_identifier(e) == id)
    }

    pub fn taps_of(&self, label: &str) -> usize {
        self.gestures
            .iter()
            .filter(|g| matches!(g, Gesture::Tap(l) if l == label))
            .count()
    }

    /// Full-screen scroll-reveal swipes received so far.
    pub fn reveal_swipes(&self) -> usize {
        let from = reveal_from();
        self.gestures
            .iter()
            .filter(|g| matches!(g, Gesture::Swipe { from: f, .. } if *f == from))
            .count()
    }

    pub fn received(&self, gesture: &Gesture) -> bool {
        self.gestures.contains(gesture)
    }

    fn check_connected(&self) -> Result<(), TraversalError> {
        if self.disconnected {
            return Err(TraversalError::DeviceUnavailable("fixture disconnected".into()));
        }
        Ok(())
    }

    fn visible(&self) -> Vec<UiElement> {
        let mut nodes: Vec<UiElement> = self
            .screens
            .get(&self.current)
            .map(|s| s.elements.iter().map(|(e, _)| e.clone()).collect())
            .unwrap_or_default();
        nodes.extend(self.overlay.iter().cloned());
        nodes
    }
}

pub fn main_window() -> Window {
    Window::new(APP, MAIN_ACTIVITY)
}

pub fn activity(name: &str) -> Window {
    Window::new(APP, name)
}

/// Config for the fixture app with every settle delay zeroed.
pub fn test_config(max_depth: usize) -> ExplorerConfig {
    ExplorerConfig {
        max_depth,
        delays: SettleDelays::none(),
        ..ExplorerConfig::for_app(APP)
    }
}

pub fn reveal_from() -> Point {
    Point::new((SCREEN.0 / 2) as i32, (SCREEN.1 as f32 * 0.8) as i32)
}

impl DeviceAccessor for FixtureDevice {
    fn current_window(&mut self) -> Result<Window, TraversalError> {
        self.check_connected()?;
        Ok(self.current.clone())
    }

    fn window_size(&mut self) -> Result<(u32, u32), TraversalError> {
        self.check_connected()?;
        Ok(SCREEN)
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, TraversalError> {
        self.check_connected()?;
        Ok(b"\x89PNG fixture".to_vec())
    }

    fn dump_hierarchy(&mut self) -> Result<String, TraversalError> {
        self.check_connected()?;
        Ok(format!("<hierarchy window=\"{}\"/>", self.current))
    }

    fn query_elements(&mut self, query: &ElementQuery) -> Result<Vec<UiElement>, TraversalError> {
        self.check_connected()?;
        if self.failing_queries.contains(query) {
            return Err(TraversalError::action_failed(query, "query rejected"));
        }
        Ok(self.visible().into_iter().filter(|e| query.matches(e)).collect())
    }

    fn tap(&mut self, element: &UiElement) -> Result<(), TraversalError> {
        self.check_connected()?;
        let id = element_identifier(element);

        if let Some(pos) = self.overlay.iter().position(|e| element_identifier(e) == id) {
            let option = self.overlay.remove(pos);
            self.gestures.push(Gesture::Tap(option.label().to_string()));
            self.overlay.clear();
            return Ok(());
        }

        let current = self.current.clone();
        let screen = self
            .screens
            .get_mut(&current)
            .ok_or_else(|| TraversalError::action_failed(element.label(), "no screen"))?;
        let (live, effect) = screen
            .elements
            .iter_mut()
            .find(|(e, _)| element_identifier(e) == id)
            .ok_or_else(|| TraversalError::action_failed(element.label(), "not on screen"))?;

        self.gestures.push(Gesture::Tap(live.label().to_string()));
        match effect.clone() {
            TapEffect::None => {}
            TapEffect::Toggle => live.flags.checked = !live.flags.checked,
            TapEffect::Navigate(window) => {
                self.overlay.clear();
                self.navigate(window);
            }
            TapEffect::Fail(reason) => {
                return Err(TraversalError::action_failed(element.label(), reason));
            }
            TapEffect::Disconnect => {
                self.disconnected = true;
                return Err(TraversalError::DeviceUnavailable("cable pulled".into()));
            }
            TapEffect::OpenOverlay(options) => self.overlay = options,
        }
        Ok(())
    }

    fn long_press(&mut self, element: &UiElement) -> Result<(), TraversalError> {
        self.check_connected()?;
        self.gestures.push(Gesture::LongPress(element.label().to_string()));
        Ok(())
    }

    fn set_text(&mut self, element: &UiElement, text: &str) -> Result<(), TraversalError> {
        self.check_connected()?;
        self.gestures
            .push(Gesture::SetText(element.label().to_string(), text.to_string()));
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point, _duration: Duration) -> Result<(), TraversalError> {
        self.check_connected()?;
        self.gestures.push(Gesture::Swipe { from, to });
        if from == reveal_from() {
            if let Some(next) = self.screens.get(&self.current).and_then(|s| s.on_scroll.clone()) {
                self.current = next;
            }
        }
        Ok(())
    }

    fn press_key(&mut self, key: Key) -> Result<(), TraversalError> {
        self.check_connected()?;
        self.gestures.push(Gesture::Key(key));
        match key {
            Key::Back if !self.overlay.is_empty() => self.overlay.clear(),
            Key::Back => {
                let blocked = self
                    .screens
                    .get(&self.current)
                    .map(|s| s.back_blocked)
                    .unwrap_or(false);
                if !blocked {
                    if let Some(previous) = self.stack.pop() {
                        self.current = previous;
                    }
                }
            }
            Key::Home => {
                self.stack.clear();
                self.current = self.launcher.clone();
            }
            Key::Enter => {}
        }
        Ok(())
    }

    fn start_app(&mut self, identifier: &str) -> Result<bool, TraversalError> {
        self.check_connected()?;
        self.gestures.push(Gesture::StartApp(identifier.to_string()));
        if identifier != APP {
            return Ok(false);
        }
        self.stack.clear();
        self.overlay.clear();
        self.current = self.main.clone();
        Ok(true)
    }

    fn stop_all_apps(&mut self) -> Result<(), TraversalError> {
        self.check_connected()?;
        self.gestures.push(Gesture::StopAll);
        self.stack.clear();
        self.overlay.clear();
        self.current = self.launcher.clone();
        Ok(())
    }
}

// ============================================================================
// Element builders
// ============================================================================

pub fn bounds(top: i32) -> Bounds {
    Bounds::new(0, top, 1080, top + 150)
}

pub fn button(id: &str) -> UiElement {
    UiElement::new("android.widget.Button", bounds(300))
        .resource_id(id)
        .clickable()
}

pub fn checkbox(id: &str, checked: bool) -> UiElement {
    UiElement::new("android.widget.CheckBox", bounds(500))
        .resource_id(id)
        .clickable()
        .checked(checked)
}

pub fn text_field(id: &str) -> UiElement {
    UiElement::new("android.widget.EditText", bounds(700))
        .resource_id(id)
        .clickable()
        .focusable()
}

pub fn row(text: &str) -> UiElement {
    UiElement::new("android.widget.LinearLayout", bounds(900))
        .text(text)
        .clickable()
}
