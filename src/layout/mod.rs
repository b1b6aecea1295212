pub mod grid;
pub mod orchestrator;

pub use grid::{place_in_cell, Cell, FlowCursor, GridLayout};
pub use orchestrator::LayoutOrchestrator;
