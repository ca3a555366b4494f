use automation::Automation;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crate::callback::{on_commit, CommitDiagnostic};
use crate::error::PanelError;
use crate::message::PanelMessage;
use crate::panel::{Panel, PanelHandle, PanelLoader, PanelView};
use crate::record::HandoffPayload;

pub const WORKER_THREAD_NAME: &str = "adjust-panel";

pub(crate) struct WorkerContext {
    pub automation: Arc<dyn Automation>,
    pub loader: Arc<dyn PanelLoader>,
    pub layout: String,
    pub diagnostics: Option<Sender<CommitDiagnostic>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shutdown {
    Clean,
    Slow,
}

/// The thread that owns the panel for one session.
pub(crate) struct PanelWorker {
    panel: PanelHandle,
    thread_id: ThreadId,
    sender: Sender<PanelMessage>,
    exited: Receiver<()>,
    thread: JoinHandle<()>,
}

impl PanelWorker {
    /// Starts the worker and waits up to `startup_timeout` for it to report a
    /// loaded panel. The payload moves into the worker whether or not the
    /// start succeeds.
    pub(crate) fn spawn(
        ctx: WorkerContext,
        payload: HandoffPayload,
        startup_timeout: Duration,
    ) -> Result<Self, PanelError> {
        let (sender, receiver) = mpsc::channel::<PanelMessage>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<PanelHandle>(1);
        let (exit_tx, exited) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _exit = exit_tx;
                run(ctx, payload, receiver, ready_tx);
            })
            .map_err(|err| {
                log::error!("failed to spawn panel thread: {err}");
                PanelError::ThreadWasNotStarted
            })?;
        let thread_id = thread.thread().id();

        match ready_rx.recv_timeout(startup_timeout) {
            Ok(panel) => Ok(Self {
                panel,
                thread_id,
                sender,
                exited,
                thread,
            }),
            Err(RecvTimeoutError::Timeout) => {
                // Dropping the sender makes a late worker leave its loop as
                // soon as it gets there; the thread is detached.
                log::error!("panel thread gave no ready signal within {startup_timeout:?}");
                drop(sender);
                Err(PanelError::ThreadWasNotStarted)
            }
            Err(RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    log::error!("panel thread panicked during startup");
                }
                Err(PanelError::ThreadWasNotStarted)
            }
        }
    }

    pub(crate) fn panel(&self) -> PanelHandle {
        self.panel
    }

    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub(crate) fn sender(&self) -> Sender<PanelMessage> {
        self.sender.clone()
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Queues `Quit` behind any pending requests and waits for the thread to
    /// end. The wait is unbounded; `warn_after` only decides when to complain.
    pub(crate) fn stop(self, warn_after: Duration) -> Shutdown {
        let _ = self.sender.send(PanelMessage::Quit);
        let shutdown = match self.exited.recv_timeout(warn_after) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Shutdown::Clean,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "panel thread {:?} has not drained its queue after {warn_after:?}; still waiting",
                    self.thread_id
                );
                let _ = self.exited.recv();
                Shutdown::Slow
            }
        };
        if self.thread.join().is_err() {
            log::error!("panel thread panicked during shutdown");
        }
        shutdown
    }
}

fn run(
    ctx: WorkerContext,
    payload: HandoffPayload,
    receiver: Receiver<PanelMessage>,
    ready: SyncSender<PanelHandle>,
) {
    if let Err(err) = ctx.automation.init_thread() {
        log::error!("panel thread could not join the automation apartment: {err}");
        return;
    }

    let mut panel = match ctx.loader.load(&ctx.layout) {
        Ok(panel) => panel,
        Err(err) => {
            log::error!("panel thread could not load '{}': {err}", ctx.layout);
            drop(payload);
            ctx.automation.uninit_thread();
            return;
        }
    };

    // Stays hidden until the session has accepted the ready signal, so a
    // worker that missed the startup bound never shows its panel.
    let mut view = PanelView::default();
    panel.render(&view);

    if ready.send(panel.handle()).is_ok() {
        log::debug!("{} ready on {:?}", panel.handle(), thread::current().id());
        view.visible = true;
        panel.render(&view);
        event_loop(
            &mut *panel,
            &mut view,
            &payload,
            &receiver,
            ctx.diagnostics.as_ref(),
        );
    }

    panel.discard();
    drop(payload);
    ctx.automation.uninit_thread();
    log::debug!("panel thread {:?} finished", thread::current().id());
}

/// The worker's only suspension point. Ends on `Quit` or once every sender
/// is gone.
fn event_loop(
    panel: &mut dyn Panel,
    view: &mut PanelView,
    payload: &HandoffPayload,
    receiver: &Receiver<PanelMessage>,
    diagnostics: Option<&Sender<CommitDiagnostic>>,
) {
    while let Ok(message) = receiver.recv() {
        match message {
            PanelMessage::Layout(layout, done) => {
                view.apply_layout(&layout);
                panel.render(view);
                let _ = done.send(());
            }
            PanelMessage::SetValue(value, reply) => {
                let status = view.set_value(value);
                panel.render(view);
                let _ = reply.send(status);
            }
            PanelMessage::DemoOverride(done) => {
                view.apply_demo();
                panel.render(view);
                let _ = done.send(());
            }
            PanelMessage::Snapshot(reply) => {
                let _ = reply.send(view.clone());
            }
            PanelMessage::Commit => on_commit(payload, diagnostics),
            PanelMessage::Quit => break,
        }
    }
}
