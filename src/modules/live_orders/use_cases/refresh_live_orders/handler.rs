use crate::modules::live_orders::adapters::outbound::line_item_sources::{
    LineItemSource, SourceFetchError,
};
use crate::modules::live_orders::adapters::outbound::projections::LiveOrdersProjectionRepository;
use crate::modules::live_orders::core::line_item::SourcedLineItem;
use crate::modules::live_orders::core::reconstruct::{RebuildStats, rebuild};
use crate::shared::core::primitives::{Clock, start_of_business_day};
use crate::shared::infrastructure::change_feed::Collection;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] SourceFetchError),

    #[error("failed to publish live orders: {0}")]
    Projection(String),

    #[error("live order refresh worker stopped")]
    WorkerStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Initial,
    Manual,
    Change(Collection),
    /// A change feed receiver fell behind and dropped notifications.
    Lagged(Collection),
}

impl std::fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTrigger::Initial => f.write_str("initial"),
            RefreshTrigger::Manual => f.write_str("manual"),
            RefreshTrigger::Change(collection) => write!(f, "change:{}", collection.as_str()),
            RefreshTrigger::Lagged(collection) => write!(f, "lagged:{}", collection.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Fetching,
    Reconstructing,
    Ready,
    Failed,
}

/// One full run: fetch both sources, rebuild, publish.
#[async_trait]
pub trait RefreshPipeline: Send + Sync {
    async fn refresh(&self, trigger: RefreshTrigger) -> Result<RebuildStats, RefreshError>;
}

pub struct RefreshLiveOrdersHandler<TProjection>
where
    TProjection: LiveOrdersProjectionRepository + Send + Sync + 'static,
{
    table_service: Arc<dyn LineItemSource>,
    counter: Arc<dyn LineItemSource>,
    projection: Arc<TProjection>,
    clock: Arc<dyn Clock>,
    venue_offset: FixedOffset,
    phase: Mutex<PipelinePhase>,
}

impl<TProjection> RefreshLiveOrdersHandler<TProjection>
where
    TProjection: LiveOrdersProjectionRepository + Send + Sync + 'static,
{
    pub fn new(
        table_service: Arc<dyn LineItemSource>,
        counter: Arc<dyn LineItemSource>,
        projection: Arc<TProjection>,
        clock: Arc<dyn Clock>,
        venue_offset: FixedOffset,
    ) -> Self {
        Self {
            table_service,
            counter,
            projection,
            clock,
            venue_offset,
            phase: Mutex::new(PipelinePhase::Idle),
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(PipelinePhase::Idle)
    }

    fn enter(&self, next: PipelinePhase) {
        if let Ok(mut phase) = self.phase.lock() {
            tracing::debug!(from = ?*phase, to = ?next, "live order pipeline phase");
            *phase = next;
        }
    }

    pub async fn handle(&self, trigger: RefreshTrigger) -> Result<RebuildStats, RefreshError> {
        let span = tracing::info_span!("refresh_live_orders", run_id = %Uuid::now_v7(), %trigger);
        async {
            let started = Instant::now();
            let result = self.run().await;
            match &result {
                Ok(stats) => tracing::info!(
                    orders = stats.orders,
                    line_items = stats.line_items,
                    dropped_orphans = stats.dropped_orphans,
                    catalog_misses = stats.catalog_misses,
                    unknown_statuses = stats.unknown_statuses,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "live orders refreshed"
                ),
                Err(error) => tracing::warn!(
                    %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "live order refresh failed"
                ),
            }
            self.enter(PipelinePhase::Idle);
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self) -> Result<RebuildStats, RefreshError> {
        self.projection
            .mark_loading()
            .await
            .map_err(|e| RefreshError::Projection(e.to_string()))?;

        self.enter(PipelinePhase::Fetching);
        let since = start_of_business_day(self.clock.now(), self.venue_offset);
        let fetched = tokio::try_join!(
            fetch_source(self.table_service.as_ref(), since),
            fetch_source(self.counter.as_ref(), since),
        );
        let (table_service_rows, counter_rows) = match fetched {
            Ok(rows) => rows,
            Err(error) => {
                self.enter(PipelinePhase::Failed);
                if let Err(store_error) = self.projection.record_failure(&error.to_string()).await {
                    tracing::error!(%store_error, "could not record live order refresh failure");
                }
                return Err(RefreshError::Fetch(error));
            }
        };

        self.enter(PipelinePhase::Reconstructing);
        let reconstruction = rebuild(table_service_rows.into_iter().chain(counter_rows));

        if let Err(error) = self
            .projection
            .replace(reconstruction.orders, self.clock.now())
            .await
        {
            self.enter(PipelinePhase::Failed);
            return Err(RefreshError::Projection(error.to_string()));
        }
        self.enter(PipelinePhase::Ready);
        Ok(reconstruction.stats)
    }
}

async fn fetch_source(
    source: &dyn LineItemSource,
    since: DateTime<Utc>,
) -> Result<Vec<SourcedLineItem>, SourceFetchError> {
    let fetched = source.fetch_since(since).await;
    match &fetched {
        Ok(rows) => tracing::debug!(source = %source.kind(), rows = rows.len(), "fetched line items"),
        Err(error) => tracing::warn!(source = %source.kind(), %error, "line item fetch failed"),
    }
    fetched
}

#[async_trait]
impl<TProjection> RefreshPipeline for RefreshLiveOrdersHandler<TProjection>
where
    TProjection: LiveOrdersProjectionRepository + Send + Sync + 'static,
{
    async fn refresh(&self, trigger: RefreshTrigger) -> Result<RebuildStats, RefreshError> {
        self.handle(trigger).await
    }
}
