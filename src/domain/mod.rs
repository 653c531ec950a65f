// Domain layer - Pure chart computations, no I/O
pub mod chart;
pub mod cursor;
pub mod dataset;
pub mod extent;
pub mod gaussian;
pub mod sample;
pub mod selection;
