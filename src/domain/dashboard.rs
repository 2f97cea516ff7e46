// Dashboard domain model
use super::identity::{validate_dashboard_id, ConfigurationError};
use super::panel::Panel;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A validated dashboard and its panels, keyed by panel name.
#[derive(Debug, Clone)]
pub struct Dashboard {
    id: String,
    panels: BTreeMap<String, Panel>,
}

impl Dashboard {
    /// Builds a dashboard, collapsing panels that share a name.
    /// The first panel inserted under a name is kept.
    pub fn new(
        id: impl Into<String>,
        panels: impl IntoIterator<Item = Panel>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        validate_dashboard_id(&id)?;

        let mut by_name = BTreeMap::new();
        for panel in panels {
            match by_name.entry(panel.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(panel);
                }
                Entry::Occupied(kept) => {
                    tracing::warn!(
                        dashboard = %id,
                        panel = %panel.name,
                        kept_panel_id = kept.get().id,
                        dropped_panel_id = panel.id,
                        "duplicate panel name, keeping first"
                    );
                }
            }
        }

        Ok(Self {
            id,
            panels: by_name,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    #[cfg(test)]
    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.get(name)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_numbers_should_be_ok() {
        let dashboard = Dashboard::new("asdfASDF1234", Vec::new()).unwrap();
        assert_eq!(dashboard.id(), "asdfASDF1234");
        assert!(dashboard.is_empty());
    }

    #[test]
    fn test_bad_ids_are_not_allowed() {
        for id in ["asdf_1234", "asdf-1243", "asdf/1234", "asdf?1234", "asdf&1234", "asdf=1234", "asdf:1234"] {
            let err = Dashboard::new(id, Vec::new()).unwrap_err();
            assert_eq!(err, ConfigurationError::InvalidDashboardId(id.to_string()));
        }
    }

    #[test]
    fn test_panels_with_same_name_collapse() {
        let dashboard = Dashboard::new(
            "asdf",
            vec![
                Panel::new(1, "test-panel").unwrap(),
                Panel::new(2, "test-panel").unwrap(),
                Panel::new(3, "other").unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(dashboard.len(), 2);
        assert_eq!(dashboard.panel("test-panel").unwrap().id, 1);
    }
}
