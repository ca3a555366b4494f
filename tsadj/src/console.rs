use adjust_panel::{Panel, PanelHandle, PanelLoader, PanelView};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::output::print_view;

/// Loads panels that print themselves to stdout on every render.
pub struct ConsoleLoader {
    next_handle: AtomicU32,
}

impl ConsoleLoader {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU32::new(1),
        }
    }
}

impl PanelLoader for ConsoleLoader {
    fn load(&self, layout: &str) -> Result<Box<dyn Panel>, String> {
        let handle = PanelHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        log::debug!("console panel {handle} stands in for '{layout}'");
        Ok(Box::new(ConsolePanel { handle }))
    }
}

struct ConsolePanel {
    handle: PanelHandle,
}

impl Panel for ConsolePanel {
    fn handle(&self) -> PanelHandle {
        self.handle
    }

    fn render(&mut self, view: &PanelView) {
        print_view(view);
    }

    fn discard(&mut self) {
        log::debug!("console panel {} discarded", self.handle);
    }
}
