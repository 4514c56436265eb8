//! HTTP layer: health endpoint and WebSocket upgrade

pub mod routes;

pub use routes::build_router;
