//! Request model and plan output for arena layout planning.
//!
//! A request names a fixed-size region and the half-open window of
//! execution ticks during which it must stay exclusively owned. The
//! planner turns a list of them into byte offsets inside one arena.

use thiserror::Error;

/// Half-open `[start, end)` interval over the execution-order timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Validity {
    /// First tick at which the region must be live.
    pub start: u64,
    /// First tick at which the region may be reclaimed.
    pub end: u64,
}

impl Validity {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// True when the two intervals share at least one tick.
    pub fn overlaps(&self, other: &Validity) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// One fixed-size region request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequest {
    /// Region size in bytes. Must be non-zero.
    pub size: usize,
    /// Ticks during which the region must remain stable.
    pub validity: Validity,
    /// Weight-gradient requests accumulate across forward/backward
    /// cycles and are laid out in a separate trailing sub-arena.
    pub is_wgrad: bool,
}

impl MemoryRequest {
    /// A regular request (activations, derivatives, scratch).
    pub fn new(size: usize, start: u64, end: u64) -> Self {
        Self {
            size,
            validity: Validity::new(start, end),
            is_wgrad: false,
        }
    }

    /// A weight-gradient request.
    pub fn wgrad(size: usize, start: u64, end: u64) -> Self {
        Self {
            size,
            validity: Validity::new(start, end),
            is_wgrad: true,
        }
    }
}

/// Malformed planning input.
///
/// These are caller contract violations; the whole request list is
/// rejected before any offset is assigned, so no partial plan escapes.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Request {index} has zero size")]
    ZeroSize { index: usize },

    #[error("Request {index} has inverted validity [{start}, {end})")]
    InvertedValidity { index: usize, start: u64, end: u64 },
}

/// Arena layout produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResult {
    /// Byte offset into the arena, one per request, in input order.
    pub offsets: Vec<usize>,
    /// Weight-gradient marker per request, carried through from input.
    pub is_wgrad: Vec<bool>,
    /// Total arena size in bytes.
    pub total_size: usize,
}

impl PlanResult {
    /// Ratio of requested bytes to arena bytes. Above 1.0 the plan is
    /// reusing freed ranges; 0.0 for an empty plan.
    pub fn efficiency(&self, requests: &[MemoryRequest]) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        let requested: usize = requests.iter().map(|r| r.size).sum();
        requested as f64 / self.total_size as f64
    }

    /// Cross-check a layout against its requests: every region must lie
    /// inside the arena and no two temporally overlapping requests may
    /// share bytes.
    ///
    /// Diagnostic aid for tests and fuzzing. The planner guarantees
    /// these properties by construction; production paths never call
    /// this.
    pub fn validate(&self, requests: &[MemoryRequest]) -> bool {
        if self.offsets.len() != requests.len() || self.is_wgrad.len() != requests.len() {
            return false;
        }
        for (idx, req) in requests.iter().enumerate() {
            if self.offsets[idx] + req.size > self.total_size {
                return false;
            }
        }
        for i in 0..requests.len() {
            for j in (i + 1)..requests.len() {
                if !requests[i].validity.overlaps(&requests[j].validity) {
                    continue;
                }
                let (a, b) = (self.offsets[i], self.offsets[j]);
                let disjoint = a + requests[i].size <= b || b + requests[j].size <= a;
                if !disjoint {
                    return false;
                }
            }
        }
        true
    }
}
