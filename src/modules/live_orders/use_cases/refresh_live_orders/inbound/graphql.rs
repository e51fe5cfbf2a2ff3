use async_graphql::{Context, Object, Result as GqlResult};

use crate::modules::live_orders::use_cases::list_live_orders::inbound::graphql::GqlLiveOrder;
use crate::shell::state::AppState;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Runs the pipeline now and returns the orders it published.
    async fn refetch_live_orders(&self, context: &Context<'_>) -> GqlResult<Vec<GqlLiveOrder>> {
        let state = context.data_unchecked::<AppState>();
        let snapshot = state
            .engine
            .refetch()
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(snapshot.orders.iter().cloned().map(Into::into).collect())
    }
}
