use std::sync::mpsc::Sender;

use crate::panel::{PanelLayout, PanelView, ValueStatus};

/// Requests marshaled onto the panel worker thread. Requests carrying a
/// `Sender` are answered once the worker has applied them.
#[derive(Debug)]
pub enum PanelMessage {
    Layout(PanelLayout, Sender<()>),
    SetValue(f64, Sender<ValueStatus>),
    DemoOverride(Sender<()>),
    Snapshot(Sender<PanelView>),
    /// Operator pressed the accept button.
    Commit,
    Quit,
}
