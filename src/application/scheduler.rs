// Export scheduler - Runs an export cycle on a fixed period
use crate::application::export_service::{CycleReport, PanelExporter};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub completed_cycles: u64,
    pub last_report: Option<CycleReport>,
}

impl Default for SchedulerStatus {
    fn default() -> Self {
        Self {
            state: SchedulerState::Idle,
            completed_cycles: 0,
            last_report: None,
        }
    }
}

pub struct ExportScheduler {
    exporter: Arc<PanelExporter>,
    period: Duration,
    status: watch::Sender<SchedulerStatus>,
}

impl ExportScheduler {
    pub fn new(exporter: Arc<PanelExporter>, period: Duration) -> Self {
        let (status, _) = watch::channel(SchedulerStatus::default());
        Self {
            exporter,
            period,
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.subscribe()
    }

    /// Run on a background task, stopped through the returned handle
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        SchedulerHandle {
            shutdown,
            task: tokio::spawn(self.run(shutdown_rx)),
        }
    }

    /// Drive cycles until `shutdown` turns true or its sender goes away.
    ///
    /// Cycles never overlap: a cycle runs inside the loop, and ticks that
    /// fall due while it runs are skipped. An in-flight cycle is dropped on
    /// shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            period_secs = self.period.as_secs(),
            dashboards = self.exporter.dashboards().len(),
            "export scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }

            self.status.send_modify(|s| s.state = SchedulerState::Running);

            tokio::select! {
                report = self.exporter.run_cycle(Utc::now()) => {
                    tracing::info!(
                        attempted = report.attempted(),
                        published = report.published,
                        fetch_failures = report.fetch_failures,
                        publish_failures = report.publish_failures,
                        "export cycle finished"
                    );
                    self.status.send_modify(|s| {
                        s.state = SchedulerState::Idle;
                        s.completed_cycles += 1;
                        s.last_report = Some(report);
                    });
                }
                _ = shutdown.wait_for(|stop| *stop) => {
                    tracing::info!("abandoning in-flight export cycle");
                    break;
                }
            }
        }

        self.status.send_modify(|s| s.state = SchedulerState::Idle);
        tracing::info!("export scheduler stopped");
    }
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait at most `grace` for the loop to exit.
    /// Returns whether it stopped cleanly in time.
    pub async fn shutdown(self, grace: Duration) -> bool {
        if self.shutdown.send(true).is_err() {
            tracing::debug!("export scheduler already stopped");
        }

        match tokio::time::timeout(grace, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "export task failed");
                false
            }
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "export task did not stop within grace period");
                false
            }
        }
    }
}
