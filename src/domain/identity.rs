// Identity rules for dashboards and panels
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid dashboardId: {0}")]
    InvalidDashboardId(String),

    #[error("invalid panel name: {0}")]
    InvalidPanelName(String),

    #[error("invalid relativeTime for panel {panel}: {value}")]
    InvalidRelativeTime { panel: String, value: String },
}

/// Dashboard ids are letters and digits only: `^[A-Za-z0-9]+$`
pub fn validate_dashboard_id(id: &str) -> Result<&str, ConfigurationError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id)
    } else {
        Err(ConfigurationError::InvalidDashboardId(id.to_string()))
    }
}

/// Panel names also allow `_` and `-`: `^[A-Za-z0-9_-]+$`
pub fn validate_panel_name(name: &str) -> Result<&str, ConfigurationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
    if !name.is_empty() && name.chars().all(allowed) {
        Ok(name)
    } else {
        Err(ConfigurationError::InvalidPanelName(name.to_string()))
    }
}
