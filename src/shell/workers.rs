// Background workers of the live order engine.
//
// Purpose
// - Own the refresh worker and the change listener for the lifetime of the engine.
//
// Responsibilities
// - Subscribe before the first run so no change slips between the initial fetch and the listener.
// - Expose the latest snapshot, snapshot subscriptions, manual refetch and shutdown.
//
// Boundaries
// - No domain logic here. Runs go through RefreshLiveOrdersHandler.

use crate::modules::live_orders::adapters::outbound::line_item_sources::LineItemSource;
use crate::modules::live_orders::adapters::outbound::projections_in_memory::InMemoryLiveOrders;
use crate::modules::live_orders::use_cases::list_live_orders::projection::LiveOrdersSnapshot;
use crate::modules::live_orders::use_cases::list_live_orders::queries_port::LiveOrderQueries;
use crate::modules::live_orders::use_cases::refresh_live_orders::change_listener::{
    ChangeListener, ChangeSubscription,
};
use crate::modules::live_orders::use_cases::refresh_live_orders::handler::{
    PipelinePhase, RefreshError, RefreshLiveOrdersHandler, RefreshTrigger,
};
use crate::modules::live_orders::use_cases::refresh_live_orders::scheduler::RefreshScheduler;
use crate::shared::core::primitives::Clock;
use crate::shared::infrastructure::change_feed::{ChangeFeed, ChangeFeedError};
use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct EngineSources {
    pub table_service: Arc<dyn LineItemSource>,
    pub counter: Arc<dyn LineItemSource>,
    pub clock: Arc<dyn Clock>,
    pub venue_offset: FixedOffset,
}

struct Workers {
    listener: ChangeSubscription,
    refresher: JoinHandle<()>,
}

pub struct LiveOrdersEngine {
    store: Arc<InMemoryLiveOrders>,
    handler: Arc<RefreshLiveOrdersHandler<InMemoryLiveOrders>>,
    scheduler: Arc<RefreshScheduler>,
    shutdown: CancellationToken,
    workers: Mutex<Option<Workers>>,
}

impl LiveOrdersEngine {
    /// Subscribes to `feed`, spawns the refresh worker and queues the initial run.
    /// Must be called from within a tokio runtime.
    pub fn start(sources: EngineSources, feed: &dyn ChangeFeed) -> Result<Self, ChangeFeedError> {
        let store = Arc::new(InMemoryLiveOrders::loading());
        let handler = Arc::new(RefreshLiveOrdersHandler::new(
            sources.table_service,
            sources.counter,
            store.clone(),
            sources.clock,
            sources.venue_offset,
        ));
        let scheduler = RefreshScheduler::new();
        let listener = ChangeListener::start(feed, scheduler.clone())?;

        let shutdown = CancellationToken::new();
        let refresher = tokio::spawn(scheduler.clone().run(handler.clone(), shutdown.clone()));
        scheduler.request(RefreshTrigger::Initial);
        tracing::info!("live orders engine started");

        Ok(Self {
            store,
            handler,
            scheduler,
            shutdown,
            workers: Mutex::new(Some(Workers { listener, refresher })),
        })
    }

    pub fn snapshot(&self) -> Arc<LiveOrdersSnapshot> {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveOrdersSnapshot>> {
        self.store.subscribe()
    }

    pub fn queries(&self) -> Arc<dyn LiveOrderQueries + Send + Sync> {
        self.store.clone()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.handler.phase()
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.scheduler.is_closed()
    }

    /// Requests a run and waits for it. Returns the snapshot that run published.
    pub async fn refetch(&self) -> Result<Arc<LiveOrdersSnapshot>, RefreshError> {
        if !self.is_running() {
            return Err(RefreshError::WorkerStopped);
        }
        let ticket = self.scheduler.request(RefreshTrigger::Manual);
        self.scheduler.wait_for(ticket).await?;
        Ok(self.store.current())
    }

    /// Stops listening, lets an in-flight run finish, then stops the worker. Safe to call twice.
    /// Dropping the engine without calling this cancels the workers without waiting for them.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let Some(workers) = self.workers.lock().await.take() else {
            return;
        };
        workers.listener.stop().await;
        if let Err(error) = workers.refresher.await {
            tracing::error!(%error, "live order refresh worker failed");
        }
        tracing::info!("live orders engine stopped");
    }
}

impl Drop for LiveOrdersEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
