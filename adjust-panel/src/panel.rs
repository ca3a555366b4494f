use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

pub const DEMO_TITLE: &str = "Adjustment panel in demo mode";
pub const DEMO_BUTTON: &str = "DEMO";
pub const DEMO_VALUE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelHandle(pub u32);

impl fmt::Display for PanelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorFormat {
    #[default]
    Decimal,
    FloatingPoint,
    Scientific,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusColor {
    #[default]
    Transparent,
    Green,
    Red,
    Magenta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStatus {
    InRange,
    OutOfRange,
    Demo,
}

impl ValueStatus {
    pub fn color(self) -> StatusColor {
        match self {
            ValueStatus::InRange => StatusColor::Green,
            ValueStatus::OutOfRange => StatusColor::Red,
            ValueStatus::Demo => StatusColor::Magenta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub format: IndicatorFormat,
    pub precision: usize,
}

impl Default for Indicator {
    fn default() -> Self {
        Self {
            value: 0.0,
            min: 0.0,
            max: 10.0,
            format: IndicatorFormat::Decimal,
            precision: 2,
        }
    }
}

/// Everything `Display` pushes to the panel in one synchronous update.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub title: String,
    pub button_label: String,
    pub unit: String,
    pub lower_label: String,
    pub upper_label: String,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub format: IndicatorFormat,
    pub precision: Option<usize>,
    pub demo: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelView {
    pub visible: bool,
    pub title: String,
    pub button_label: String,
    pub unit: String,
    pub lower_label: String,
    pub upper_label: String,
    pub indicator: Indicator,
    pub status: StatusColor,
}

impl PanelView {
    pub fn apply_layout(&mut self, layout: &PanelLayout) {
        self.title = layout.title.clone();
        self.button_label = layout.button_label.clone();
        self.unit = layout.unit.clone();
        self.lower_label = layout.lower_label.clone();
        self.upper_label = layout.upper_label.clone();
        self.indicator.min = layout.lower_limit;
        self.indicator.max = layout.upper_limit;
        self.indicator.format = layout.format;
        if let Some(precision) = layout.precision {
            self.indicator.precision = precision;
        }
        if layout.demo {
            self.title = DEMO_TITLE.to_string();
            self.button_label = DEMO_BUTTON.to_string();
        }
    }

    /// Range check against the indicator's own bounds, not the caller's.
    pub fn set_value(&mut self, value: f64) -> ValueStatus {
        self.indicator.value = value;
        let status = if value < self.indicator.min || value > self.indicator.max {
            ValueStatus::OutOfRange
        } else {
            ValueStatus::InRange
        };
        self.status = status.color();
        status
    }

    pub fn apply_demo(&mut self) {
        self.title = DEMO_TITLE.to_string();
        self.status = StatusColor::Magenta;
        self.indicator.value = DEMO_VALUE;
    }
}

/// A loaded panel. Implementations are thread-affine: they are created,
/// rendered and discarded on the panel worker thread only.
pub trait Panel {
    fn handle(&self) -> PanelHandle;
    fn render(&mut self, view: &PanelView);
    fn discard(&mut self);
}

pub trait PanelLoader: Send + Sync {
    /// Called on the worker thread with the configured layout name.
    fn load(&self, layout: &str) -> Result<Box<dyn Panel>, String>;
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessSnapshot {
    pub loads: usize,
    pub discards: usize,
    pub renders: usize,
    pub visible_renders: usize,
    pub foreign_renders: usize,
    pub visible: bool,
    pub view: Option<PanelView>,
    pub owner: Option<ThreadId>,
}

/// Shared record of what the headless panel "shows".
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    inner: Arc<Mutex<HeadlessSnapshot>>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HeadlessSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct HeadlessLoader {
    display: HeadlessDisplay,
    failure: Option<String>,
    load_delay: Duration,
    next_handle: AtomicU32,
}

impl HeadlessLoader {
    pub fn new(display: HeadlessDisplay) -> Self {
        Self {
            display,
            failure: None,
            load_delay: Duration::ZERO,
            next_handle: AtomicU32::new(1),
        }
    }

    pub fn failing(display: HeadlessDisplay, reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::new(display)
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }
}

impl PanelLoader for HeadlessLoader {
    fn load(&self, layout: &str) -> Result<Box<dyn Panel>, String> {
        if !self.load_delay.is_zero() {
            thread::sleep(self.load_delay);
        }
        if let Some(reason) = &self.failure {
            return Err(format!("failed to load '{layout}': {reason}"));
        }
        let owner = thread::current().id();
        {
            let mut state = self.display.lock();
            state.loads += 1;
            state.owner = Some(owner);
        }
        Ok(Box::new(HeadlessPanel {
            handle: PanelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed)),
            display: self.display.clone(),
            owner,
        }))
    }
}

struct HeadlessPanel {
    handle: PanelHandle,
    display: HeadlessDisplay,
    owner: ThreadId,
}

impl Panel for HeadlessPanel {
    fn handle(&self) -> PanelHandle {
        self.handle
    }

    fn render(&mut self, view: &PanelView) {
        let mut state = self.display.lock();
        state.renders += 1;
        if thread::current().id() != self.owner {
            state.foreign_renders += 1;
        }
        if view.visible {
            state.visible_renders += 1;
        }
        state.visible = view.visible;
        state.view = Some(view.clone());
    }

    fn discard(&mut self) {
        let mut state = self.display.lock();
        state.discards += 1;
        state.visible = false;
    }
}
