// Renderer trait for fetching panel images
use crate::domain::outcome::FetchOutcome;
use crate::domain::panel::Panel;
use crate::domain::window::FetchWindow;
use async_trait::async_trait;

#[async_trait]
pub trait PanelRenderer: Send + Sync {
    /// Render one panel of a dashboard over the given window.
    /// Every failure, including transport errors, comes back as `FetchOutcome::Failure`.
    async fn render(&self, dashboard_id: &str, panel: &Panel, window: &FetchWindow) -> FetchOutcome;
}
