use automation::ObjHandle;
use resmgr::{ResourceId, ResourceManager, ResourceType, KEY_DEMO_MODE, KEY_SIMULATION, KEY_TRACE};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{ErrorReport, PanelError};
use crate::format::{button_label, limit_label, NumericFormat};
use crate::panel::{PanelLayout, ValueStatus};
use crate::record::{lock_record, BenchRecord};
use crate::session::{Acquired, PanelSessionManager, Released};
use crate::trace::StepTrace;

pub const LIB_VERSION: &str = concat!("TSADJ ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRequest<'a> {
    pub step_name: &'a str,
    pub button_text: &'a str,
    pub unit: &'a str,
    pub format: &'a str,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

/// The step-library surface the sequencer calls into.
pub struct AdjustmentLibrary {
    resmgr: Arc<dyn ResourceManager>,
    sessions: Arc<PanelSessionManager>,
}

impl AdjustmentLibrary {
    pub fn new(resmgr: Arc<dyn ResourceManager>, sessions: Arc<PanelSessionManager>) -> Self {
        Self { resmgr, sessions }
    }

    pub fn sessions(&self) -> &PanelSessionManager {
        &self.sessions
    }

    fn report(&self, id: ResourceId, err: PanelError) -> ErrorReport {
        ErrorReport::new(&*self.resmgr, id, None, &err)
    }

    pub fn setup(
        &self,
        _sequence_context: ObjHandle,
        bench_name: &str,
    ) -> Result<ResourceId, ErrorReport> {
        let id = self
            .resmgr
            .alloc_resource(bench_name)
            .map_err(|err| self.report(ResourceId::INVALID, err.into()))?;

        let trace = match self.resmgr.compare_value(id, KEY_TRACE, "1") {
            Ok(enabled) => {
                self.resmgr.set_trace_flag(id, enabled);
                StepTrace::begin(&*self.resmgr, id, "Setup")
            }
            Err(err) => {
                let report = self.report(id, err.into());
                let _ = self.resmgr.free_resource(id);
                return Err(report);
            }
        };
        trace.step(&format!("Tracing for {LIB_VERSION} enabled"));
        trace.step(&format!("Bench name {bench_name} -> Resource ID {id}"));

        let result = self
            .setup_record(id, &trace)
            .map(|_| id)
            .map_err(|err| self.report(id, err));
        trace.finish(&result);
        if result.is_err() {
            let _ = self.resmgr.free_memory(id);
            let _ = self.resmgr.free_resource(id);
        }
        result
    }

    fn setup_record(&self, id: ResourceId, trace: &StepTrace<'_>) -> Result<(), PanelError> {
        if self.resmgr.resource_type(id)? != ResourceType::Bench {
            return Err(PanelError::NotABench);
        }
        let simulation = self.resmgr.compare_value(id, KEY_SIMULATION, "1")?;
        let demo_mode = self.resmgr.compare_value(id, KEY_DEMO_MODE, "1")?;
        self.resmgr.alloc_memory(
            id,
            Arc::new(Mutex::new(BenchRecord::new(simulation, demo_mode))),
        )?;
        if simulation {
            trace.step("Simulation is enabled!");
        }
        if demo_mode {
            trace.step("Demo mode is enabled!");
        }
        Ok(())
    }

    pub fn display(
        &self,
        sequence_context: ObjHandle,
        id: ResourceId,
        request: &DisplayRequest<'_>,
    ) -> Result<(), ErrorReport> {
        let trace = StepTrace::begin(&*self.resmgr, id, "DisplayAdjustmentPanel");
        let result = self
            .display_panel(sequence_context, id, request, &trace)
            .map_err(|err| self.report(id, err));
        trace.finish(&result);
        result
    }

    fn display_panel(
        &self,
        sequence_context: ObjHandle,
        id: ResourceId,
        request: &DisplayRequest<'_>,
        trace: &StepTrace<'_>,
    ) -> Result<(), PanelError> {
        let record = BenchRecord::resolve(&*self.resmgr, id)?;
        let format = NumericFormat::parse(request.format)?;
        let demo_mode = lock_record(&record).demo_mode;
        let (indicator_format, precision) = format.indicator_format();
        let layout = PanelLayout {
            title: request.step_name.to_string(),
            button_label: button_label(request.button_text),
            unit: request.unit.to_string(),
            lower_label: limit_label("LL", &format, request.lower_limit, request.unit),
            upper_label: limit_label("UL", &format, request.upper_limit, request.unit),
            lower_limit: request.lower_limit,
            upper_limit: request.upper_limit,
            format: indicator_format,
            precision,
            demo: demo_mode,
        };

        trace.step("Acquire panel session");
        match self.sessions.acquire(sequence_context)? {
            Acquired::Started { panel, thread } => {
                trace.step(&format!("Created panel thread {thread:?} for {panel}"));
                let mut record = lock_record(&record);
                record.actual_panel_handle = Some(panel);
                record.owner_thread_id = Some(thread);
            }
            Acquired::Joined { live_use_count } => {
                trace.step(&format!("ThreadCount: {live_use_count}"));
                let mut record = lock_record(&record);
                record.actual_panel_handle = self.sessions.panel_handle();
                record.owner_thread_id = self.sessions.worker_thread_id();
            }
        }

        self.sessions.update_layout(layout)
    }

    pub fn set_value(
        &self,
        _sequence_context: ObjHandle,
        id: ResourceId,
        value: f64,
    ) -> Result<ValueStatus, ErrorReport> {
        let trace = StepTrace::begin(&*self.resmgr, id, "SetValueAdjustmentPanel");
        let result = self
            .set_panel_value(id, value)
            .map_err(|err| self.report(id, err));
        trace.finish(&result);
        result
    }

    fn set_panel_value(&self, id: ResourceId, value: f64) -> Result<ValueStatus, PanelError> {
        let record = BenchRecord::resolve(&*self.resmgr, id)?;
        let demo_mode = lock_record(&record).demo_mode;
        let status = self.sessions.set_value(value)?;
        if !demo_mode {
            return Ok(status);
        }
        thread::sleep(self.sessions.config().demo_delay());
        self.sessions.demo_override()?;
        Ok(ValueStatus::Demo)
    }

    pub fn hide(&self, _sequence_context: ObjHandle, id: ResourceId) -> Result<(), ErrorReport> {
        let trace = StepTrace::begin(&*self.resmgr, id, "HideAdjustmentPanel");
        let result = self
            .hide_panel(id, &trace)
            .map_err(|err| self.report(id, err));
        trace.finish(&result);
        result
    }

    fn hide_panel(&self, id: ResourceId, trace: &StepTrace<'_>) -> Result<(), PanelError> {
        let record = BenchRecord::resolve(&*self.resmgr, id)?;
        trace.step("Release panel session");
        match self.sessions.release() {
            Released::Stopped => {
                trace.step("Panel thread joined");
                let mut record = lock_record(&record);
                record.actual_panel_handle = None;
                record.owner_thread_id = None;
            }
            Released::StillInUse { live_use_count } => {
                trace.step(&format!("ThreadCount: {live_use_count}"));
            }
            Released::NotLive => trace.step("No panel session was live"),
        }
        Ok(())
    }

    pub fn cleanup(&self, _sequence_context: ObjHandle, id: ResourceId) -> Result<(), ErrorReport> {
        let trace = StepTrace::begin(&*self.resmgr, id, "Cleanup");
        let result = self.release_resource(id, &trace).map_err(|err| self.report(id, err));
        trace.finish(&result);
        result
    }

    fn release_resource(&self, id: ResourceId, trace: &StepTrace<'_>) -> Result<(), PanelError> {
        BenchRecord::resolve(&*self.resmgr, id)?;
        let live = self.sessions.live_use_count();
        if live > 0 {
            log::warn!("cleanup of resource {id} while {live} panel user(s) are still live");
        }
        self.resmgr.free_memory(id)?;
        self.resmgr.free_resource(id)?;
        trace.step(&format!("Free Resource ID {id}"));
        Ok(())
    }
}
