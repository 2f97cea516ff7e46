// Presentation layer - Liveness and readiness endpoints
pub mod app_state;
pub mod handlers;
