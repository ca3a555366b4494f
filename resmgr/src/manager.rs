use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    BenchConfig, PrivateMemory, ResmgrError, ResourceDefinition, ResourceId, ResourceManager,
    ResourceType, TraceSink,
};

struct Allocation {
    definition: ResourceDefinition,
    memory: Option<PrivateMemory>,
    trace: bool,
}

#[derive(Default)]
struct Allocations {
    next_id: i64,
    entries: HashMap<ResourceId, Allocation>,
}

pub struct InMemoryResourceManager {
    config: BenchConfig,
    sink: Arc<dyn TraceSink>,
    allocations: Mutex<Allocations>,
}

impl InMemoryResourceManager {
    pub fn new(config: BenchConfig, sink: Arc<dyn TraceSink>) -> Self {
        Self {
            config,
            sink,
            allocations: Mutex::new(Allocations::default()),
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn allocated_count(&self) -> usize {
        self.allocations().entries.len()
    }

    fn allocations(&self) -> MutexGuard<'_, Allocations> {
        self.allocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn with_entry<T>(
        &self,
        id: ResourceId,
        f: impl FnOnce(&mut Allocation) -> Result<T, ResmgrError>,
    ) -> Result<T, ResmgrError> {
        let mut allocations = self.allocations();
        let entry = allocations
            .entries
            .get_mut(&id)
            .ok_or(ResmgrError::InvalidResourceId(id))?;
        f(entry)
    }
}

impl ResourceManager for InMemoryResourceManager {
    fn alloc_resource(&self, name: &str) -> Result<ResourceId, ResmgrError> {
        let definition = self
            .config
            .find(name)
            .cloned()
            .ok_or_else(|| ResmgrError::UnknownResource(name.to_string()))?;
        let mut allocations = self.allocations();
        allocations.next_id += 1;
        let id = ResourceId(allocations.next_id);
        allocations.entries.insert(
            id,
            Allocation {
                definition,
                memory: None,
                trace: false,
            },
        );
        log::debug!("allocated resource '{name}' as id {id}");
        Ok(id)
    }

    fn free_resource(&self, id: ResourceId) -> Result<(), ResmgrError> {
        self.allocations()
            .entries
            .remove(&id)
            .map(|_| ())
            .ok_or(ResmgrError::InvalidResourceId(id))
    }

    fn resource_type(&self, id: ResourceId) -> Result<ResourceType, ResmgrError> {
        self.with_entry(id, |entry| Ok(entry.definition.kind))
    }

    fn resource_name(&self, id: ResourceId) -> Result<String, ResmgrError> {
        self.with_entry(id, |entry| Ok(entry.definition.name.clone()))
    }

    fn compare_value(
        &self,
        id: ResourceId,
        key: &str,
        expected: &str,
    ) -> Result<bool, ResmgrError> {
        self.with_entry(id, |entry| {
            Ok(entry
                .definition
                .keys
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.trim() == expected)
                .unwrap_or(false))
        })
    }

    fn alloc_memory(&self, id: ResourceId, block: PrivateMemory) -> Result<(), ResmgrError> {
        self.with_entry(id, |entry| {
            if entry.memory.is_some() {
                return Err(ResmgrError::MemoryAlreadyAllocated(id));
            }
            entry.memory = Some(block);
            Ok(())
        })
    }

    fn memory(&self, id: ResourceId) -> Result<PrivateMemory, ResmgrError> {
        self.with_entry(id, |entry| {
            entry.memory.clone().ok_or(ResmgrError::NoMemory(id))
        })
    }

    fn free_memory(&self, id: ResourceId) -> Result<(), ResmgrError> {
        self.with_entry(id, |entry| {
            entry
                .memory
                .take()
                .map(|_| ())
                .ok_or(ResmgrError::NoMemory(id))
        })
    }

    fn trace_flag(&self, id: ResourceId) -> bool {
        self.allocations()
            .entries
            .get(&id)
            .map(|entry| entry.trace)
            .unwrap_or(false)
    }

    fn set_trace_flag(&self, id: ResourceId, enabled: bool) {
        if let Some(entry) = self.allocations().entries.get_mut(&id) {
            entry.trace = enabled;
        }
    }

    fn trace(&self, line: &str) {
        self.sink.write(line);
    }
}
