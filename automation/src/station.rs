use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::{Automation, AutomationError, ObjHandle, PropertyOption, E_NOT_INITIALIZED};

#[derive(Debug)]
enum ObjectKind {
    Execution,
    SequenceContext { execution: u64 },
}

#[derive(Debug)]
struct Object {
    kind: ObjectKind,
    properties: HashMap<String, bool>,
}

#[derive(Default)]
struct StationState {
    next_object: u64,
    next_handle: u64,
    objects: HashMap<u64, Object>,
    handles: HashMap<ObjHandle, u64>,
    apartments: HashMap<ThreadId, usize>,
    fail_execution: Option<AutomationError>,
    fail_add_ref: Option<AutomationError>,
    fail_property_write: Option<AutomationError>,
}

impl StationState {
    fn new_object(&mut self, kind: ObjectKind) -> u64 {
        self.next_object += 1;
        self.objects.insert(
            self.next_object,
            Object {
                kind,
                properties: HashMap::new(),
            },
        );
        self.next_object
    }

    fn new_handle(&mut self, object: u64) -> ObjHandle {
        self.next_handle += 1;
        let handle = ObjHandle(self.next_handle);
        self.handles.insert(handle, object);
        handle
    }

    fn object_of(&self, handle: ObjHandle) -> Result<u64, AutomationError> {
        self.handles
            .get(&handle)
            .copied()
            .ok_or_else(|| AutomationError::invalid_handle(handle))
    }
}

/// In-process stand-in for the host sequencer: executions, sequence contexts
/// with boolean properties, and a counted handle table.
#[derive(Default)]
pub struct Station {
    state: Mutex<StationState>,
}

impl Station {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new execution and returns a caller-owned handle to its
    /// sequence context.
    pub fn start_execution(&self) -> ObjHandle {
        let mut state = self.state();
        let execution = state.new_object(ObjectKind::Execution);
        let context = state.new_object(ObjectKind::SequenceContext { execution });
        state.new_handle(context)
    }

    pub fn live_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Number of live handles that refer to the same object as `handle`.
    pub fn references_to(&self, handle: ObjHandle) -> usize {
        let state = self.state();
        match state.handles.get(&handle) {
            Some(object) => state.handles.values().filter(|o| *o == object).count(),
            None => 0,
        }
    }

    pub fn apartment_threads(&self) -> usize {
        self.state().apartments.len()
    }

    pub fn fail_next_execution(&self, error: AutomationError) {
        self.state().fail_execution = Some(error);
    }

    pub fn fail_next_add_ref(&self, error: AutomationError) {
        self.state().fail_add_ref = Some(error);
    }

    pub fn fail_next_property_write(&self, error: AutomationError) {
        self.state().fail_property_write = Some(error);
    }
}

impl Automation for Station {
    fn init_thread(&self) -> Result<(), AutomationError> {
        *self
            .state()
            .apartments
            .entry(thread::current().id())
            .or_insert(0) += 1;
        Ok(())
    }

    fn uninit_thread(&self) {
        let mut state = self.state();
        let id = thread::current().id();
        if let Some(count) = state.apartments.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                state.apartments.remove(&id);
            }
        }
    }

    fn execution(&self, context: ObjHandle) -> Result<ObjHandle, AutomationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_execution.take() {
            return Err(err);
        }
        let object = state.object_of(context)?;
        let execution = match state.objects.get(&object).map(|o| &o.kind) {
            Some(ObjectKind::SequenceContext { execution }) => *execution,
            _ => return Err(AutomationError::invalid_handle(context)),
        };
        Ok(state.new_handle(execution))
    }

    fn add_ref(&self, handle: ObjHandle) -> Result<ObjHandle, AutomationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_add_ref.take() {
            return Err(err);
        }
        let object = state.object_of(handle)?;
        Ok(state.new_handle(object))
    }

    fn discard(&self, handle: ObjHandle) {
        if self.state().handles.remove(&handle).is_none() {
            log::warn!("discarding unknown automation handle {handle}");
        }
    }

    fn set_bool_property(
        &self,
        handle: ObjHandle,
        lookup: &str,
        value: bool,
        option: PropertyOption,
    ) -> Result<(), AutomationError> {
        let mut state = self.state();
        if let Some(err) = state.fail_property_write.take() {
            return Err(err);
        }
        if !state.apartments.contains_key(&thread::current().id()) {
            return Err(AutomationError::new(
                E_NOT_INITIALIZED,
                "The calling thread has not joined an apartment.",
            ));
        }
        let object = state.object_of(handle)?;
        let properties = &mut state
            .objects
            .get_mut(&object)
            .ok_or_else(|| AutomationError::invalid_handle(handle))?
            .properties;
        match (properties.get_mut(lookup), option) {
            (Some(existing), _) => *existing = value,
            (None, PropertyOption::InsertIfMissing) => {
                properties.insert(lookup.to_string(), value);
            }
            (None, PropertyOption::None) => return Err(AutomationError::unknown_name(lookup)),
        }
        Ok(())
    }

    fn bool_property(&self, handle: ObjHandle, lookup: &str) -> Result<bool, AutomationError> {
        let state = self.state();
        let object = state.object_of(handle)?;
        state
            .objects
            .get(&object)
            .and_then(|o| o.properties.get(lookup).copied())
            .ok_or_else(|| AutomationError::unknown_name(lookup))
    }
}
