//! Fuzz target for arena layout planning.
//!
//! Arbitrary request lists must either be rejected up front or produce
//! a layout where no two temporally overlapping requests share bytes,
//! and planning the same list twice must give the same answer.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use swapcore::{IntervalPlanner, MemoryRequest};

#[derive(Arbitrary, Debug)]
struct RawRequest {
    size: u16,
    start: u8,
    span: u8,
    wgrad: bool,
}

fuzz_target!(|raw: Vec<RawRequest>| {
    let requests: Vec<MemoryRequest> = raw
        .iter()
        .take(256)
        .map(|r| {
            let start = r.start as u64;
            let end = start + r.span as u64;
            if r.wgrad {
                MemoryRequest::wgrad(r.size as usize, start, end)
            } else {
                MemoryRequest::new(r.size as usize, start, end)
            }
        })
        .collect();

    let planner = IntervalPlanner::new();
    let Ok(plan) = planner.plan_layout(&requests) else {
        // Zero sizes and empty spans are rejected, never mis-planned.
        return;
    };

    assert!(plan.validate(&requests));

    let again = planner
        .plan_layout(&requests)
        .expect("a plannable list stays plannable");
    assert_eq!(plan, again);
});
