//! Static arena layout planning over request validity intervals.

mod interval;
mod request;

pub use interval::IntervalPlanner;
pub use request::{MemoryRequest, PlanError, PlanResult, Validity};
