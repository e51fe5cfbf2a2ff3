use async_graphql::{Context, ID, Object, Result as GqlResult};

use crate::modules::live_orders::core::logical_order::{LineItemView, LogicalOrder};
use crate::modules::live_orders::use_cases::list_live_orders::projection::LiveOrdersSnapshot;
use crate::shell::state::AppState;

#[derive(async_graphql::SimpleObject, Clone)]
pub struct GqlLineItem {
    pub line_item_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub category: Option<String>,
    pub preparation_time_minutes: Option<u32>,
    pub quantity: u32,
    /// Decimal rendered as a string.
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
    /// Milliseconds since the epoch.
    pub recorded_at: i64,
    pub status: String,
}

impl From<LineItemView> for GqlLineItem {
    fn from(v: LineItemView) -> Self {
        Self {
            line_item_id: v.line_item_id,
            menu_item_id: v.menu_item_id,
            name: v.name,
            category: v.category,
            preparation_time_minutes: v.preparation_time_minutes,
            quantity: v.quantity,
            unit_price: v.unit_price.to_string(),
            line_total: v.line_total.to_string(),
            notes: v.notes,
            recorded_at: v.recorded_at.timestamp_millis(),
            status: v.status.as_str().to_string(),
        }
    }
}

#[derive(async_graphql::SimpleObject, Clone)]
pub struct GqlLiveOrder {
    pub id: ID,
    pub source_kind: String,
    pub origin_label: String,
    pub status: String,
    pub total: String,
    pub item_count: u32,
    pub created_at: i64,
    pub last_touched_at: i64,
    pub note: String,
    pub items: Vec<GqlLineItem>,
}

impl From<LogicalOrder> for GqlLiveOrder {
    fn from(v: LogicalOrder) -> Self {
        Self {
            id: ID(v.id.clone()),
            source_kind: v.source_kind.as_str().to_string(),
            origin_label: v.origin_label.clone(),
            status: v.status.as_str().to_string(),
            total: v.total.to_string(),
            item_count: v.item_count(),
            created_at: v.created_at.timestamp_millis(),
            last_touched_at: v.last_touched_at.timestamp_millis(),
            note: v.note,
            items: v.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(async_graphql::SimpleObject, Clone)]
pub struct GqlLiveOrdersStatus {
    pub is_loading: bool,
    pub error: Option<String>,
    pub refreshed_at: Option<i64>,
    pub generation: i64,
    pub order_count: i32,
}

impl From<&LiveOrdersSnapshot> for GqlLiveOrdersStatus {
    fn from(v: &LiveOrdersSnapshot) -> Self {
        Self {
            is_loading: v.is_loading,
            error: v.error.clone(),
            refreshed_at: v.refreshed_at.map(|at| at.timestamp_millis()),
            generation: i64::try_from(v.generation).unwrap_or(i64::MAX),
            order_count: i32::try_from(v.orders.len()).unwrap_or(i32::MAX),
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn live_orders(&self, context: &Context<'_>) -> GqlResult<Vec<GqlLiveOrder>> {
        let state = context.data_unchecked::<AppState>();
        let orders = state.queries.list().await?;
        Ok(orders.into_iter().map(Into::into).collect())
    }

    async fn live_order(&self, context: &Context<'_>, id: ID) -> GqlResult<Option<GqlLiveOrder>> {
        let state = context.data_unchecked::<AppState>();
        let order = state.queries.find(&id).await?;
        Ok(order.map(Into::into))
    }

    async fn live_orders_status(&self, context: &Context<'_>) -> GqlResult<GqlLiveOrdersStatus> {
        let state = context.data_unchecked::<AppState>();
        let snapshot = state.queries.snapshot().await?;
        Ok(snapshot.as_ref().into())
    }
}
