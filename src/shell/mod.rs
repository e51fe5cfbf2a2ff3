// Composition root for the live_orders bounded context.
//
// Responsibilities
// - Read config from environment.
// - Instantiate concrete infrastructure implementations.
// - Wire implementations into the refresh pipeline.
// - Spawn and stop background workers (refresh worker, change listener).

pub mod config;
pub mod graphql;
pub mod http;
pub mod state;
pub mod workers;
