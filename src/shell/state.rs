use crate::modules::live_orders::use_cases::list_live_orders::queries_port::LiveOrderQueries;
use crate::shell::workers::LiveOrdersEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub queries: Arc<dyn LiveOrderQueries + Send + Sync>,
    pub engine: Arc<LiveOrdersEngine>,
}

impl AppState {
    pub fn new(engine: Arc<LiveOrdersEngine>) -> Self {
        Self {
            queries: engine.queries(),
            engine,
        }
    }
}
