use crate::domain::dashboard::Dashboard;
use crate::domain::identity::ConfigurationError;
use crate::domain::panel::Panel;
use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ExporterConfig {
    pub grafana: GrafanaSettings,
    #[serde(default)]
    pub export: ExportSettings,
    pub kafka: KafkaSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GrafanaSettings {
    pub base_url: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl GrafanaSettings {
    pub fn time_zone(&self) -> anyhow::Result<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid grafana.time_zone {}: {}", self.time_zone, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_dashboards_file")]
    pub dashboards_file: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            dashboards_file: default_dashboards_file(),
        }
    }
}

impl ExportSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaSettings {
    pub rest_proxy_url: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl ServerSettings {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_time_zone() -> String {
    "Europe/Oslo".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_period_secs() -> u64 {
    60
}

fn default_max_concurrent_fetches() -> usize {
    1
}

fn default_dashboards_file() -> String {
    "config/dashboards.json".to_string()
}

fn default_topic() -> String {
    "exported-panels".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

/// Dashboard entry as written in the dashboards file
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub id: String,
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    pub id: i64,
    pub name: String,
    pub relative_time: Option<String>,
}

impl PanelConfig {
    pub fn into_panel(self) -> Result<Panel, ConfigurationError> {
        let panel = Panel::new(self.id, self.name)?;
        match self.relative_time {
            Some(value) => {
                let offset = Panel::parse_relative_time(&panel.name, &value)?;
                Ok(panel.with_relative_time(offset))
            }
            None => Ok(panel),
        }
    }
}

impl DashboardConfig {
    pub fn into_dashboard(self) -> Result<Dashboard, ConfigurationError> {
        let panels = self
            .panels
            .into_iter()
            .map(PanelConfig::into_panel)
            .collect::<Result<Vec<_>, _>>()?;
        Dashboard::new(self.id, panels)
    }
}

/// Layered settings: optional `config/exporter` file, then `EXPORTER_*` env
/// vars with `__` between sections (`EXPORTER_GRAFANA__BASE_URL`)
pub fn load_exporter_config() -> anyhow::Result<ExporterConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/exporter").required(false))
        .add_source(
            config::Environment::with_prefix("EXPORTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn parse_dashboards(contents: &str) -> anyhow::Result<Vec<Dashboard>> {
    let entries: Vec<DashboardConfig> =
        serde_json::from_str(contents).context("dashboards file is not a list of dashboards")?;

    let dashboards = entries
        .into_iter()
        .map(DashboardConfig::into_dashboard)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(dashboards)
}

pub fn load_dashboards(path: impl AsRef<Path>) -> anyhow::Result<Vec<Dashboard>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dashboards from {}", path.display()))?;
    parse_dashboards(&contents).with_context(|| format!("invalid dashboards in {}", path.display()))
}
