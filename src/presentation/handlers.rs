// HTTP request handlers
use crate::application::scheduler::SchedulerState;
use crate::presentation::app_state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub running: bool,
    pub completed_cycles: u64,
    pub last_published: Option<usize>,
    pub last_failed: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn is_alive() -> &'static str {
    "ALIVE"
}

/// Ready once the first export cycle has finished
pub async fn is_ready(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if state.scheduler.borrow().completed_cycles > 0 {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

pub async fn export_status(State(state): State<Arc<AppState>>) -> Json<StatusBody> {
    let status = *state.scheduler.borrow();
    Json(StatusBody {
        running: status.state == SchedulerState::Running,
        completed_cycles: status.completed_cycles,
        last_published: status.last_report.map(|r| r.published),
        last_failed: status
            .last_report
            .map(|r| r.fetch_failures + r.publish_failures),
    })
}
