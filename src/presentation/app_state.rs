// Application state for HTTP handlers
use crate::application::scheduler::SchedulerStatus;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: watch::Receiver<SchedulerStatus>,
}
