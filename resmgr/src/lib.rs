use serde::Deserialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub mod config;
pub mod manager;
pub mod trace;

pub use config::{BenchConfig, ResourceDefinition};
pub use manager::InMemoryResourceManager;
pub use trace::{LogTraceSink, MemoryTraceSink, TraceSink};

/// Error codes shared by every bench library built on the resource manager.
pub const GTSL_ERR_BASE: i64 = -1_000_000;
pub const GTSL_ERR_UNKNOWN_RESOURCE: i64 = GTSL_ERR_BASE - 1;
pub const GTSL_ERR_INVALID_RESOURCE_ID: i64 = GTSL_ERR_BASE - 2;
pub const GTSL_ERR_MEMORY_ALLOCATED: i64 = GTSL_ERR_BASE - 3;
pub const GTSL_ERR_NO_MEMORY: i64 = GTSL_ERR_BASE - 4;
pub const GTSL_ERR_WRONG_RESOURCE_ID: i64 = GTSL_ERR_BASE - 5;
pub const GTSL_ERR_CONFIG: i64 = GTSL_ERR_BASE - 6;

pub const KEY_TRACE: &str = "Trace";
pub const KEY_SIMULATION: &str = "Simulation";
pub const KEY_DEMO_MODE: &str = "DemoMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub i64);

impl ResourceId {
    pub const INVALID: ResourceId = ResourceId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Bench,
    Device,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResmgrError {
    #[error("resource '{0}' was not found in the configuration")]
    UnknownResource(String),
    #[error("resource id {0} is not allocated")]
    InvalidResourceId(ResourceId),
    #[error("a memory block is already allocated for resource id {0}")]
    MemoryAlreadyAllocated(ResourceId),
    #[error("no memory block is allocated for resource id {0}")]
    NoMemory(ResourceId),
    #[error("failed to read configuration '{source_name}': {reason}")]
    Config { source_name: String, reason: String },
}

impl ResmgrError {
    pub fn code(&self) -> i64 {
        match self {
            ResmgrError::UnknownResource(_) => GTSL_ERR_UNKNOWN_RESOURCE,
            ResmgrError::InvalidResourceId(_) => GTSL_ERR_INVALID_RESOURCE_ID,
            ResmgrError::MemoryAlreadyAllocated(_) => GTSL_ERR_MEMORY_ALLOCATED,
            ResmgrError::NoMemory(_) => GTSL_ERR_NO_MEMORY,
            ResmgrError::Config { .. } => GTSL_ERR_CONFIG,
        }
    }
}

/// Opaque per-resource memory block. Libraries downcast it to their own record
/// type; a failed downcast means the id belongs to somebody else.
pub type PrivateMemory = Arc<dyn Any + Send + Sync>;

pub trait ResourceManager: Send + Sync {
    fn alloc_resource(&self, name: &str) -> Result<ResourceId, ResmgrError>;
    fn free_resource(&self, id: ResourceId) -> Result<(), ResmgrError>;
    fn resource_type(&self, id: ResourceId) -> Result<ResourceType, ResmgrError>;
    fn resource_name(&self, id: ResourceId) -> Result<String, ResmgrError>;
    fn compare_value(&self, id: ResourceId, key: &str, expected: &str)
        -> Result<bool, ResmgrError>;

    fn alloc_memory(&self, id: ResourceId, block: PrivateMemory) -> Result<(), ResmgrError>;
    fn memory(&self, id: ResourceId) -> Result<PrivateMemory, ResmgrError>;
    fn free_memory(&self, id: ResourceId) -> Result<(), ResmgrError>;

    fn trace_flag(&self, id: ResourceId) -> bool;
    fn set_trace_flag(&self, id: ResourceId, enabled: bool);
    fn trace(&self, line: &str);
}
