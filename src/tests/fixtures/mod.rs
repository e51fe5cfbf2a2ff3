pub mod rows;
pub mod state;
