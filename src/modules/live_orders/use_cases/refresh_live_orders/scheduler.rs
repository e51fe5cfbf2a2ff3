// Refresh scheduling for the live order pipeline.
//
// Purpose
// - Run the pipeline one run at a time, however many triggers arrive.
//
// Responsibilities
// - Every trigger takes a ticket. A run serves every ticket taken before it started.
// - Triggers landing during a run collapse into a single follow-up run.
// - An in-flight run is never aborted. Shutdown takes effect between runs.

use crate::modules::live_orders::core::reconstruct::RebuildStats;
use crate::modules::live_orders::use_cases::refresh_live_orders::handler::{
    RefreshError, RefreshPipeline, RefreshTrigger,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Completion {
    ticket: u64,
    outcome: Result<RebuildStats, RefreshError>,
    closed: bool,
}

pub struct RefreshScheduler {
    requested: AtomicU64,
    latest_trigger: Mutex<Option<RefreshTrigger>>,
    wake: Notify,
    completed: watch::Sender<Completion>,
}

impl RefreshScheduler {
    pub fn new() -> Arc<Self> {
        let (completed, _) = watch::channel(Completion {
            ticket: 0,
            outcome: Ok(RebuildStats::default()),
            closed: false,
        });
        Arc::new(Self {
            requested: AtomicU64::new(0),
            latest_trigger: Mutex::new(None),
            wake: Notify::new(),
            completed,
        })
    }

    /// Asks for a run and returns the ticket it will be served under.
    pub fn request(&self, trigger: RefreshTrigger) -> u64 {
        if let Ok(mut latest) = self.latest_trigger.lock() {
            *latest = Some(trigger);
        }
        let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(ticket, %trigger, "live order refresh requested");
        self.wake.notify_one();
        ticket
    }

    /// Waits for the first run that started after `ticket` was taken.
    pub async fn wait_for(&self, ticket: u64) -> Result<RebuildStats, RefreshError> {
        let mut receiver = self.completed.subscribe();
        let completion = receiver
            .wait_for(|completion| completion.ticket >= ticket || completion.closed)
            .await
            .map_err(|_| RefreshError::WorkerStopped)?;
        if completion.ticket < ticket {
            return Err(RefreshError::WorkerStopped);
        }
        completion.outcome.clone()
    }

    pub fn completed_ticket(&self) -> u64 {
        self.completed.borrow().ticket
    }

    pub fn is_closed(&self) -> bool {
        self.completed.borrow().closed
    }

    fn take_trigger(&self) -> RefreshTrigger {
        self.latest_trigger
            .lock()
            .ok()
            .and_then(|mut latest| latest.take())
            .unwrap_or(RefreshTrigger::Manual)
    }

    pub async fn run(self: Arc<Self>, pipeline: Arc<dyn RefreshPipeline>, shutdown: CancellationToken) {
        tracing::info!("live order refresh worker started");
        let mut served = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.wake.notified() => {}
            }
            let target = self.requested.load(Ordering::SeqCst);
            if target <= served {
                continue;
            }
            let trigger = self.take_trigger();
            let coalesced = target - served - 1;
            if coalesced > 0 {
                tracing::debug!(coalesced, "coalescing live order refresh triggers");
            }
            let outcome = pipeline.refresh(trigger).await;
            served = target;
            self.completed.send_replace(Completion {
                ticket: target,
                outcome,
                closed: false,
            });
        }
        self.completed.send_modify(|completion| completion.closed = true);
        tracing::info!("live order refresh worker stopped");
    }
}
