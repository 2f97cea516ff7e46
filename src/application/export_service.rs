// Export service - Fetch every panel of every dashboard and publish the images
use crate::application::panel_publisher::PanelPublisher;
use crate::application::panel_renderer::PanelRenderer;
use crate::domain::dashboard::Dashboard;
use crate::domain::outcome::{FailureKind, FetchFailure, FetchOutcome};
use crate::domain::panel::Panel;
use crate::domain::record::OutgoingRecord;
use crate::domain::window::FetchWindow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::stream::{self, Stream};
use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;

/// Fetch every panel of a dashboard, yielding one outcome per panel.
///
/// Panels are independent: a failing panel never keeps the others from
/// being attempted. With `concurrency > 1` outcomes arrive in completion order.
pub fn fetch_all<'a>(
    renderer: &'a dyn PanelRenderer,
    dashboard: &'a Dashboard,
    window: &'a FetchWindow,
    concurrency: usize,
) -> impl Stream<Item = (&'a Panel, FetchOutcome)> + Send + 'a {
    stream::iter(dashboard.panels())
        .map(move |panel| async move {
            let outcome = AssertUnwindSafe(renderer.render(dashboard.id(), panel, window))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    FetchOutcome::Failure(FetchFailure::new(
                        FailureKind::Internal,
                        None,
                        "renderer panicked",
                    ))
                });
            (panel, outcome)
        })
        .buffer_unordered(concurrency.max(1))
}

/// Tally of one export cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub published: usize,
    pub fetch_failures: usize,
    pub publish_failures: usize,
}

impl CycleReport {
    pub fn attempted(&self) -> usize {
        self.published + self.fetch_failures + self.publish_failures
    }
}

pub struct PanelExporter {
    renderer: Arc<dyn PanelRenderer>,
    publisher: Arc<dyn PanelPublisher>,
    dashboards: Vec<Dashboard>,
    time_zone: Tz,
    max_concurrent_fetches: usize,
}

impl PanelExporter {
    pub fn new(
        renderer: Arc<dyn PanelRenderer>,
        publisher: Arc<dyn PanelPublisher>,
        dashboards: Vec<Dashboard>,
        time_zone: Tz,
    ) -> Self {
        Self {
            renderer,
            publisher,
            dashboards,
            time_zone,
            max_concurrent_fetches: 1,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    /// Run one cycle over the window from local midnight until `now`
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let window = FetchWindow::today(now, self.time_zone);
        let mut report = CycleReport::default();

        tracing::debug!(
            from = %window.start,
            to = %window.end,
            tz = window.time_zone_id(),
            dashboards = self.dashboards.len(),
            "starting export cycle"
        );

        for dashboard in &self.dashboards {
            let mut outcomes = pin!(fetch_all(
                self.renderer.as_ref(),
                dashboard,
                &window,
                self.max_concurrent_fetches,
            ));

            while let Some((panel, outcome)) = outcomes.next().await {
                match outcome {
                    FetchOutcome::Success(image) => {
                        if self.publish(dashboard, panel, image).await {
                            report.published += 1;
                        } else {
                            report.publish_failures += 1;
                        }
                    }
                    FetchOutcome::Failure(failure) => {
                        report.fetch_failures += 1;
                        tracing::warn!(
                            dashboard = dashboard.id(),
                            panel_id = panel.id,
                            panel = %panel.name,
                            status = failure.status,
                            kind = %failure.kind,
                            cause = ?failure.cause,
                            error = %failure,
                            "failed to fetch panel"
                        );
                    }
                }
            }
        }

        report
    }

    async fn publish(&self, dashboard: &Dashboard, panel: &Panel, image: bytes::Bytes) -> bool {
        let size = image.len();
        let record = OutgoingRecord::new(dashboard.id(), &panel.name, image);
        let key = record.key.clone();

        match AssertUnwindSafe(self.publisher.publish(record))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {
                tracing::info!(key = %key, bytes = size, "published panel image");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "failed to publish panel image");
                false
            }
            Err(_) => {
                tracing::error!(key = %key, "publisher panicked");
                false
            }
        }
    }
}
