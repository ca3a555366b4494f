use resmgr::{ResourceId, ResourceManager};

use crate::error::ErrorReport;

/// Begin/step/end lines for one library call, written to the resource
/// manager's trace sink when the resource's trace flag is set.
pub(crate) struct StepTrace<'a> {
    resmgr: &'a dyn ResourceManager,
    operation: &'static str,
    enabled: bool,
}

impl<'a> StepTrace<'a> {
    pub(crate) fn begin(
        resmgr: &'a dyn ResourceManager,
        id: ResourceId,
        operation: &'static str,
    ) -> Self {
        let trace = Self {
            resmgr,
            operation,
            enabled: resmgr.trace_flag(id),
        };
        trace.step(&format!(">>TSADJ_{operation} begin"));
        trace
    }

    pub(crate) fn step(&self, line: &str) {
        log::debug!("{}: {line}", self.operation);
        if self.enabled {
            self.resmgr.trace(line);
        }
    }

    pub(crate) fn finish<T>(self, result: &Result<T, ErrorReport>) {
        if let Err(report) = result {
            self.step(&format!("Error {} : {}", report.code, report.message));
        }
        self.step(&format!("<<TSADJ_{} end", self.operation));
    }
}
