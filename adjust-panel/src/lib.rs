pub mod callback;
pub mod config;
pub mod error;
pub mod format;
pub mod library;
mod message;
pub mod panel;
pub mod record;
pub mod session;
mod trace;
mod worker;

pub use callback::{CommitDiagnostic, BUTTON_HIT_PROPERTY};
pub use config::{ConfigError, PanelConfig};
pub use error::{format_error, ErrorReport, PanelError, StepStatus};
pub use format::NumericFormat;
pub use library::{AdjustmentLibrary, DisplayRequest, LIB_VERSION};
pub use panel::{
    HeadlessDisplay, HeadlessLoader, HeadlessSnapshot, Panel, PanelHandle, PanelLayout,
    PanelLoader, PanelView, StatusColor, ValueStatus,
};
pub use record::{BenchRecord, HandoffPayload, OWNER_MAGIC};
pub use session::{Acquired, PanelSessionManager, Released, SessionStats};
pub use worker::WORKER_THREAD_NAME;
