// Presentation layer - HTTP surface over the chart service
pub mod app_state;
pub mod handlers;
