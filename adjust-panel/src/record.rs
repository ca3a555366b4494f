use automation::{Automation, AutomationError, ObjHandle};
use resmgr::{ResourceId, ResourceManager};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;

use crate::error::{PanelError, TSPAN_ERR_BASE};
use crate::panel::PanelHandle;

/// Stamped into every record this library allocates.
pub const OWNER_MAGIC: i64 = TSPAN_ERR_BASE;

#[derive(Debug, Clone, PartialEq)]
pub struct BenchRecord {
    pub owner: i64,
    pub simulation: bool,
    pub demo_mode: bool,
    pub actual_panel_handle: Option<PanelHandle>,
    pub owner_thread_id: Option<ThreadId>,
}

pub type SharedRecord = Arc<Mutex<BenchRecord>>;

impl BenchRecord {
    pub fn new(simulation: bool, demo_mode: bool) -> Self {
        Self {
            owner: OWNER_MAGIC,
            simulation,
            demo_mode,
            actual_panel_handle: None,
            owner_thread_id: None,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner == OWNER_MAGIC
    }

    /// Looks up the private memory block of `id` and checks that it is one of
    /// ours.
    pub fn resolve(resmgr: &dyn ResourceManager, id: ResourceId) -> Result<SharedRecord, PanelError> {
        let record = resmgr
            .memory(id)?
            .downcast::<Mutex<BenchRecord>>()
            .map_err(|_| PanelError::WrongResourceId)?;
        if !lock_record(&record).is_owned() {
            return Err(PanelError::WrongResourceId);
        }
        Ok(record)
    }
}

pub fn lock_record(record: &Mutex<BenchRecord>) -> MutexGuard<'_, BenchRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The two automation references a session hands to its worker thread.
/// Whoever holds the payload owns both references; dropping it discards them.
pub struct HandoffPayload {
    automation: Arc<dyn Automation>,
    execution: ObjHandle,
    context: ObjHandle,
}

impl HandoffPayload {
    pub fn acquire(
        automation: Arc<dyn Automation>,
        sequence_context: ObjHandle,
    ) -> Result<Self, AutomationError> {
        let running = automation.execution(sequence_context)?;
        let execution = automation.add_ref(running);
        automation.discard(running);
        let execution = execution?;
        let context = match automation.add_ref(sequence_context) {
            Ok(context) => context,
            Err(err) => {
                automation.discard(execution);
                return Err(err);
            }
        };
        Ok(Self {
            automation,
            execution,
            context,
        })
    }

    pub fn automation(&self) -> &dyn Automation {
        &*self.automation
    }

    pub fn execution(&self) -> ObjHandle {
        self.execution
    }

    pub fn context(&self) -> ObjHandle {
        self.context
    }
}

impl Drop for HandoffPayload {
    fn drop(&mut self) {
        self.automation.discard(self.execution);
        self.automation.discard(self.context);
    }
}
