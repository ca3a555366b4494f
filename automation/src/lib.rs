use std::fmt;

pub mod station;

pub use station::Station;

pub const E_INVALID_HANDLE: i64 = -2_147_024_890;
pub const E_UNKNOWN_NAME: i64 = -2_147_352_570;
pub const E_NOT_INITIALIZED: i64 = -2_147_221_008;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjHandle(pub u64);

impl fmt::Display for ObjHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOption {
    None,
    InsertIfMissing,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AutomationError {
    pub code: i64,
    pub message: String,
}

impl AutomationError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_handle(handle: ObjHandle) -> Self {
        Self::new(
            E_INVALID_HANDLE,
            format!("The handle {handle} is invalid."),
        )
    }

    pub fn unknown_name(lookup: &str) -> Self {
        Self::new(E_UNKNOWN_NAME, format!("Unknown name '{lookup}'."))
    }
}

/// The part of the host sequencer's object model used by step libraries.
///
/// Every handle returned by this trait is one counted reference and must be
/// given back through [`Automation::discard`] by whoever ends up owning it.
pub trait Automation: Send + Sync {
    /// Joins the calling thread to the multi-threaded apartment.
    fn init_thread(&self) -> Result<(), AutomationError>;
    fn uninit_thread(&self);

    /// New reference to the execution running the given sequence context.
    fn execution(&self, context: ObjHandle) -> Result<ObjHandle, AutomationError>;
    /// New reference to the same object `handle` refers to.
    fn add_ref(&self, handle: ObjHandle) -> Result<ObjHandle, AutomationError>;
    fn discard(&self, handle: ObjHandle);

    fn set_bool_property(
        &self,
        handle: ObjHandle,
        lookup: &str,
        value: bool,
        option: PropertyOption,
    ) -> Result<(), AutomationError>;
    fn bool_property(&self, handle: ObjHandle, lookup: &str) -> Result<bool, AutomationError>;
}
