use automation::{AutomationError, PropertyOption};
use std::sync::mpsc::Sender;

use crate::record::HandoffPayload;

pub const BUTTON_HIT_PROPERTY: &str = "Locals.AdjustmentPanelButtonHit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDiagnostic {
    pub error: AutomationError,
}

/// Runs on the worker thread when the operator accepts the displayed value.
/// Failures never reach the sequencer; they are logged and, when a channel is
/// attached, reported as a [`CommitDiagnostic`].
pub(crate) fn on_commit(payload: &HandoffPayload, diagnostics: Option<&Sender<CommitDiagnostic>>) {
    let result = payload.automation().set_bool_property(
        payload.context(),
        BUTTON_HIT_PROPERTY,
        true,
        PropertyOption::InsertIfMissing,
    );
    if let Err(error) = result {
        log::warn!(
            "failed to set {BUTTON_HIT_PROPERTY} (code {}): {}",
            error.code,
            error.message
        );
        if let Some(tx) = diagnostics {
            let _ = tx.send(CommitDiagnostic { error });
        }
    }
}
