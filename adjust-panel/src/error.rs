use automation::AutomationError;
use resmgr::{ResmgrError, ResourceId, ResourceManager, GTSL_ERR_WRONG_RESOURCE_ID};

pub const LIBRARY_NAME: &str = "TSADJ";

pub const TSPAN_ERR_BASE: i64 = -1_004_000;
pub const TSPAN_ERR_NOT_A_BENCH: i64 = TSPAN_ERR_BASE - 1;
pub const TSPAN_ERR_THREAD_WAS_NOT_STARTED: i64 = TSPAN_ERR_BASE - 2;
pub const TSPAN_ERR_WRONG_FORMAT_TYPE: i64 = TSPAN_ERR_BASE - 3;
pub const TSPAN_ERR_PANEL_NOT_DISPLAYED: i64 = TSPAN_ERR_BASE - 4;

const PREFIX_LIBRARY: &str = "Library: ";
const PREFIX_BENCH: &str = "Bench: ";
const PREFIX_DEVICE: &str = "Device: ";
const PREFIX_MESSAGE: &str = "Error: ";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("The given resource is not a bench")]
    NotABench,
    #[error("Thread was not started. Possible cause: UIR file was not found.")]
    ThreadWasNotStarted,
    #[error("Format type is not supported.")]
    WrongFormatType { format: String },
    #[error("The resource ID was not issued by this library")]
    WrongResourceId,
    #[error("The adjustment panel is not displayed.")]
    PanelNotDisplayed,
    #[error(transparent)]
    Automation(#[from] AutomationError),
    #[error(transparent)]
    Resource(#[from] ResmgrError),
}

impl PanelError {
    pub fn code(&self) -> i64 {
        match self {
            PanelError::NotABench => TSPAN_ERR_NOT_A_BENCH,
            PanelError::ThreadWasNotStarted => TSPAN_ERR_THREAD_WAS_NOT_STARTED,
            PanelError::WrongFormatType { .. } => TSPAN_ERR_WRONG_FORMAT_TYPE,
            PanelError::WrongResourceId => GTSL_ERR_WRONG_RESOURCE_ID,
            PanelError::PanelNotDisplayed => TSPAN_ERR_PANEL_NOT_DISPLAYED,
            PanelError::Automation(err) => err.code,
            PanelError::Resource(err) => err.code(),
        }
    }
}

/// Failure of one library call: the numeric code plus the formatted,
/// multi-line message handed back to the sequencer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ErrorReport {
    pub code: i64,
    pub message: String,
}

impl ErrorReport {
    pub fn new(
        resmgr: &dyn ResourceManager,
        id: ResourceId,
        device: Option<&str>,
        err: &PanelError,
    ) -> Self {
        Self {
            code: err.code(),
            message: format_error(resmgr, id, device, err),
        }
    }
}

/// The `errorOccurred` / `errorCode` / `errorMessage` triple of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepStatus {
    pub error_occurred: bool,
    pub error_code: i64,
    pub error_message: String,
}

impl<T> From<&Result<T, ErrorReport>> for StepStatus {
    fn from(result: &Result<T, ErrorReport>) -> Self {
        match result {
            Ok(_) => StepStatus::default(),
            Err(report) => StepStatus {
                error_occurred: true,
                error_code: report.code,
                error_message: report.message.clone(),
            },
        }
    }
}

pub fn format_error(
    resmgr: &dyn ResourceManager,
    id: ResourceId,
    device: Option<&str>,
    err: &PanelError,
) -> String {
    let mut buffer = format!("{PREFIX_LIBRARY}{LIBRARY_NAME}\n");
    if id.is_valid() {
        if let Ok(name) = resmgr.resource_name(id) {
            if !name.is_empty() {
                buffer.push_str(PREFIX_BENCH);
                buffer.push_str(&name);
                buffer.push('\n');
            }
        }
    }
    if let Some(device) = device {
        buffer.push_str(PREFIX_DEVICE);
        buffer.push_str(device);
        buffer.push('\n');
    }
    buffer.push_str(PREFIX_MESSAGE);
    buffer.push_str(&err.to_string());
    buffer
}
