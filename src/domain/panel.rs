// Panel domain model
use super::identity::{validate_panel_name, ConfigurationError};
use chrono::Duration;

/// Longest accepted relative time, about ten years
const MAX_RELATIVE_TIME_DAYS: i64 = 3653;

/// A single renderable panel. `id` is only used in the rendering request;
/// identity within a dashboard is the `name`.
#[derive(Debug, Clone)]
pub struct Panel {
    pub id: i64,
    pub name: String,
    pub relative_time: Option<Duration>,
}

impl Panel {
    pub fn new(id: i64, name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        validate_panel_name(&name)?;
        Ok(Self {
            id,
            name,
            relative_time: None,
        })
    }

    pub fn with_relative_time(mut self, relative_time: Duration) -> Self {
        self.relative_time = Some(relative_time);
        self
    }

    /// Parse Grafana's relative time shorthand ("30m", "6h", "1d", "2w")
    pub fn parse_relative_time(panel: &str, value: &str) -> Result<Duration, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidRelativeTime {
            panel: panel.to_string(),
            value: value.to_string(),
        };

        let value = value.trim();
        let split = value.len().checked_sub(1).ok_or_else(invalid)?;
        if !value.is_char_boundary(split) {
            return Err(invalid());
        }
        let (amount, unit) = value.split_at(split);
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        if amount < 0 {
            return Err(invalid());
        }

        let duration = match unit {
            "s" => Duration::try_seconds(amount),
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            "w" => Duration::try_weeks(amount),
            _ => None,
        };
        duration
            .filter(|offset| *offset <= Duration::days(MAX_RELATIVE_TIME_DAYS))
            .ok_or_else(invalid)
    }
}

impl PartialEq for Panel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Panel {}
