// Application layer - Export use cases and the ports they depend on
pub mod export_service;
pub mod panel_publisher;
pub mod panel_renderer;
pub mod scheduler;
