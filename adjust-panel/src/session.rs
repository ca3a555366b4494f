use automation::{Automation, ObjHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;

use crate::callback::CommitDiagnostic;
use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::message::PanelMessage;
use crate::panel::{PanelHandle, PanelLayout, PanelLoader, PanelView, ValueStatus};
use crate::record::HandoffPayload;
use crate::worker::{PanelWorker, Shutdown, WorkerContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub spawns: usize,
    pub joins: usize,
    pub startup_failures: usize,
    pub slow_shutdowns: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// This call took the count from 0 to 1 and started the worker.
    Started { panel: PanelHandle, thread: ThreadId },
    Joined { live_use_count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// This call took the count from 1 to 0; the worker has been joined.
    Stopped,
    StillInUse { live_use_count: usize },
    /// Nothing was live; the count stays at zero.
    NotLive,
}

#[derive(Default)]
struct SessionState {
    live_use_count: usize,
    worker: Option<PanelWorker>,
}

/// Process-wide owner of the adjustment panel session.
///
/// `acquire`/`release` calls are counted; the first acquire starts a worker
/// thread that creates the panel, the matching last release stops it. All
/// panel access goes through messages to that worker. Both transitions run
/// with the state lock held, so a start and a stop never overlap.
///
/// Every other call that reads the state (`live_use_count`, `panel_handle`,
/// `worker_thread_id`, `is_worker_alive` and the panel requests) waits
/// behind a transition in progress: up to `startup_timeout` for a start, and
/// for as long as the worker takes to finish on a stop, which is unbounded.
pub struct PanelSessionManager {
    automation: Arc<dyn Automation>,
    loader: Arc<dyn PanelLoader>,
    config: PanelConfig,
    diagnostics: Option<Sender<CommitDiagnostic>>,
    state: Mutex<SessionState>,
    spawns: AtomicUsize,
    joins: AtomicUsize,
    startup_failures: AtomicUsize,
    slow_shutdowns: AtomicUsize,
}

impl PanelSessionManager {
    pub fn new(
        automation: Arc<dyn Automation>,
        loader: Arc<dyn PanelLoader>,
        config: PanelConfig,
    ) -> Self {
        Self {
            automation,
            loader,
            config,
            diagnostics: None,
            state: Mutex::new(SessionState::default()),
            spawns: AtomicUsize::new(0),
            joins: AtomicUsize::new(0),
            startup_failures: AtomicUsize::new(0),
            slow_shutdowns: AtomicUsize::new(0),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Sender<CommitDiagnostic>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers one more user of the panel. A failed start is rolled back:
    /// the count returns to zero and nothing stays allocated.
    pub fn acquire(&self, sequence_context: ObjHandle) -> Result<Acquired, PanelError> {
        let mut state = self.state();
        state.live_use_count += 1;
        if state.live_use_count > 1 {
            log::debug!("panel session joined, live use count {}", state.live_use_count);
            return Ok(Acquired::Joined {
                live_use_count: state.live_use_count,
            });
        }

        match self.start_worker(sequence_context) {
            Ok(worker) => {
                self.spawns.fetch_add(1, Ordering::SeqCst);
                let acquired = Acquired::Started {
                    panel: worker.panel(),
                    thread: worker.thread_id(),
                };
                log::debug!("panel session started: {acquired:?}");
                state.worker = Some(worker);
                Ok(acquired)
            }
            Err(err) => {
                state.live_use_count -= 1;
                self.startup_failures.fetch_add(1, Ordering::SeqCst);
                log::error!("panel session failed to start: {err}");
                Err(err)
            }
        }
    }

    fn start_worker(&self, sequence_context: ObjHandle) -> Result<PanelWorker, PanelError> {
        let payload = HandoffPayload::acquire(self.automation.clone(), sequence_context)?;
        let ctx = WorkerContext {
            automation: self.automation.clone(),
            loader: self.loader.clone(),
            layout: self.config.layout.clone(),
            diagnostics: self.diagnostics.clone(),
        };
        PanelWorker::spawn(ctx, payload, self.config.startup_timeout())
    }

    /// Drops one user of the panel. The last release stops the worker and
    /// only returns once the worker thread has ended.
    pub fn release(&self) -> Released {
        let mut state = self.state();
        match state.live_use_count {
            0 => {
                log::warn!("panel release without a live session ignored");
                return Released::NotLive;
            }
            1 => {}
            n => {
                state.live_use_count = n - 1;
                log::debug!("panel session still in use, live use count {}", n - 1);
                return Released::StillInUse {
                    live_use_count: n - 1,
                };
            }
        }

        state.live_use_count = 0;
        if let Some(worker) = state.worker.take() {
            let panel = worker.panel();
            if worker.stop(self.config.shutdown_warning()) == Shutdown::Slow {
                self.slow_shutdowns.fetch_add(1, Ordering::SeqCst);
            }
            self.joins.fetch_add(1, Ordering::SeqCst);
            log::debug!("panel session stopped, {panel} discarded");
        }
        Released::Stopped
    }

    fn sender(&self) -> Result<Sender<PanelMessage>, PanelError> {
        self.state()
            .worker
            .as_ref()
            .map(PanelWorker::sender)
            .ok_or(PanelError::PanelNotDisplayed)
    }

    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> PanelMessage) -> Result<T, PanelError> {
        let sender = self.sender()?;
        let (reply_tx, reply_rx) = mpsc::channel();
        sender
            .send(build(reply_tx))
            .map_err(|_| PanelError::PanelNotDisplayed)?;
        reply_rx.recv().map_err(|_| PanelError::PanelNotDisplayed)
    }

    pub fn update_layout(&self, layout: PanelLayout) -> Result<(), PanelError> {
        self.request(|done| PanelMessage::Layout(layout, done))
    }

    pub fn set_value(&self, value: f64) -> Result<ValueStatus, PanelError> {
        self.request(|reply| PanelMessage::SetValue(value, reply))
    }

    pub fn demo_override(&self) -> Result<(), PanelError> {
        self.request(PanelMessage::DemoOverride)
    }

    pub fn snapshot(&self) -> Option<PanelView> {
        self.request(PanelMessage::Snapshot).ok()
    }

    /// Queues an operator accept event, as a button press would.
    pub fn operator_commit(&self) -> Result<(), PanelError> {
        self.sender()?
            .send(PanelMessage::Commit)
            .map_err(|_| PanelError::PanelNotDisplayed)
    }

    pub fn live_use_count(&self) -> usize {
        self.state().live_use_count
    }

    pub fn panel_handle(&self) -> Option<PanelHandle> {
        self.state().worker.as_ref().map(PanelWorker::panel)
    }

    pub fn worker_thread_id(&self) -> Option<ThreadId> {
        self.state().worker.as_ref().map(PanelWorker::thread_id)
    }

    pub fn is_worker_alive(&self) -> bool {
        self.state()
            .worker
            .as_ref()
            .map(PanelWorker::is_alive)
            .unwrap_or(false)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            spawns: self.spawns.load(Ordering::SeqCst),
            joins: self.joins.load(Ordering::SeqCst),
            startup_failures: self.startup_failures.load(Ordering::SeqCst),
            slow_shutdowns: self.slow_shutdowns.load(Ordering::SeqCst),
        }
    }
}
