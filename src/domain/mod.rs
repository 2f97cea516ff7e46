// Domain layer - Dashboards, panels and what a cycle produces
pub mod dashboard;
pub mod identity;
pub mod outcome;
pub mod panel;
pub mod record;
pub mod window;
