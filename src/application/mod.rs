// Application layer - Chart pipeline and its ports
pub mod chart_service;
pub mod dataset_repository;
pub mod tooltip;
