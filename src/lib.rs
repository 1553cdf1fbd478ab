//! swapcore
//!
//! Memory planning and disk swap for out-of-core model execution: train
//! and serve models whose working set exceeds physical RAM.
//!
//! # Two Pieces
//!
//! - **Planner**: [`planner::IntervalPlanner`] turns per-region validity
//!   intervals into a compact static layout, one byte offset per request
//!   inside a single contiguous arena. Freed ranges are reused; two
//!   requests that are ever live together never share bytes.
//! - **Swap device**: [`swap::SwapDevice`] moves region bytes between
//!   RAM and a backing file sized to the planned arena, through
//!   page-aligned mapped windows or plain buffered copies. Inference
//!   runs can stream persisted weights by id in one shot.
//!
//! The two never call each other. The engine that owns the execution
//! timeline asks the planner for a layout once, then drives the device
//! with the planned offsets as regions enter and leave their validity
//! windows.
//!
//! # Concurrency
//!
//! Everything here is synchronous and single-owner: planning is a pure
//! function, and a device instance expects one caller at a time.

pub mod config;
pub mod planner;
pub mod swap;
pub mod telemetry;

pub use planner::{IntervalPlanner, MemoryRequest, PlanError, PlanResult, Validity};
pub use swap::{
    BackingKind, BufferHandle, ExecutionMode, SwapConfig, SwapDevice, SwapError, WeightId,
    WeightPreloadTable,
};
