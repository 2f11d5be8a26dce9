pub mod ai;
pub mod clock;
pub mod config;
pub mod cv;
pub mod errors;
pub mod llm_client;
pub mod payment;
pub mod persistence;
pub mod premium;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;
