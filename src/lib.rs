// src/lib.rs

pub mod assessment;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod normalizer;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod store;

// Re-export specific items for convenience if needed
pub use routes::create_router;
