// Grafana render client
use crate::application::panel_renderer::PanelRenderer;
use crate::domain::outcome::{FailureKind, FetchFailure, FetchOutcome};
use crate::domain::panel::Panel;
use crate::domain::window::FetchWindow;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};
use reqwest::StatusCode;
use std::time::Duration;

const PNG: &str = "image/png";
const MAX_ERROR_BODY_BYTES: usize = 200;

#[derive(Debug, Clone)]
pub struct GrafanaClient {
    base_url: String,
    client: reqwest::Client,
}

impl GrafanaClient {
    /// Redirects are never followed: Grafana answers a render request with
    /// the image itself, anything else is a misconfiguration or a login page.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// `None` when the panel's relative time pushes `from` out of range
    pub fn render_url(&self, dashboard_id: &str, panel: &Panel, window: &FetchWindow) -> Option<String> {
        let from = window.from_millis(panel)?;
        Some(format!(
            "{}/render/d-solo/{}/{}?panelId={}&from={}&to={}&tz={}",
            self.base_url,
            dashboard_id,
            panel.name,
            panel.id,
            from,
            window.to_millis(),
            urlencoding::encode(window.time_zone_id())
        ))
    }
}

/// Start of an error body, reading no more than `MAX_ERROR_BODY_BYTES`
async fn error_excerpt(mut response: reqwest::Response) -> String {
    let mut excerpt = Vec::with_capacity(MAX_ERROR_BODY_BYTES);
    while excerpt.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => excerpt.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "failed to read error body");
                break;
            }
        }
    }
    excerpt.truncate(MAX_ERROR_BODY_BYTES);
    String::from_utf8_lossy(&excerpt).into_owned()
}

fn content_type(headers: &HeaderMap) -> String {
    let values: Vec<&str> = headers
        .get_all(CONTENT_TYPE)
        .iter()
        .map(|v| v.to_str().unwrap_or("<binary>"))
        .collect();

    if values.is_empty() {
        "<none>".to_string()
    } else {
        values.join(", ")
    }
}

fn is_png(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_TYPE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.trim().eq_ignore_ascii_case(PNG))
}

#[async_trait]
impl PanelRenderer for GrafanaClient {
    async fn render(&self, dashboard_id: &str, panel: &Panel, window: &FetchWindow) -> FetchOutcome {
        let Some(url) = self.render_url(dashboard_id, panel, window) else {
            return FetchOutcome::Failure(FetchFailure::new(
                FailureKind::Internal,
                None,
                format!("relative time of panel {} moves the window start out of range", panel.name),
            ));
        };
        tracing::debug!(%url, "fetching");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome::Failure(
                    FetchFailure::new(FailureKind::Transport, None, format!("request to {} failed", url))
                        .with_cause(e),
                );
            }
        };

        let status = response.status();
        tracing::info!(%url, status = status.as_u16(), "response");

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<none>");
            return FetchOutcome::Failure(FetchFailure::new(
                FailureKind::Redirect,
                Some(status.as_u16()),
                format!("refusing to follow redirect to {}", location),
            ));
        }

        if status != StatusCode::OK {
            let body = error_excerpt(response).await;
            return FetchOutcome::Failure(FetchFailure::new(
                FailureKind::Status,
                Some(status.as_u16()),
                format!("render failed with status {}: {}", status, body),
            ));
        }

        if !is_png(response.headers()) {
            return FetchOutcome::Failure(FetchFailure::new(
                FailureKind::ContentType,
                Some(status.as_u16()),
                format!("expected a {}, got {}", PNG, content_type(response.headers())),
            ));
        }

        match response.bytes().await {
            Ok(image) => FetchOutcome::Success(image),
            Err(e) => FetchOutcome::Failure(
                FetchFailure::new(
                    FailureKind::Transport,
                    Some(status.as_u16()),
                    "failed to read image body",
                )
                .with_cause(e),
            ),
        }
    }
}
