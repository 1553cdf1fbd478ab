//! First-fit interval planner.
//!
//! Requests are granted in validity-start order: regions produced early
//! in the timeline tend to be consumed by later stages, so start order
//! matches the access pattern. When two requests start on the same tick
//! the longer-lived one is placed first, which keeps short-lived gaps
//! from fragmenting the space freed later.

use super::request::{MemoryRequest, PlanError, PlanResult, Validity};

/// Range currently assigned to a live request.
#[derive(Debug, Clone, Copy)]
struct OccupiedRange {
    offset: usize,
    size: usize,
    /// Tick at which the owning request's validity ends.
    release_tick: u64,
}

/// Reusable gap between occupied ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeRange {
    offset: usize,
    size: usize,
}

/// Slot in the trailing weight-gradient sub-arena. One slot may serve
/// several wgrad requests as long as their validities never overlap.
#[derive(Debug)]
struct WgradSlot {
    offset: usize,
    size: usize,
    spans: Vec<Validity>,
}

/// Offline first-fit planner over request validity intervals.
///
/// [`plan_layout`](IntervalPlanner::plan_layout) is deterministic and
/// side-effect free: the same request list always yields the same
/// offsets and arena size.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalPlanner;

impl IntervalPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Compute a byte offset for every request plus the total arena
    /// size.
    ///
    /// Requests whose validity intervals overlap are never assigned
    /// intersecting ranges. Freed ranges are reused first-fit by
    /// ascending offset; the arena grows only when nothing fits.
    pub fn plan_layout(&self, requests: &[MemoryRequest]) -> Result<PlanResult, PlanError> {
        validate_requests(requests)?;

        let mut offsets = vec![0usize; requests.len()];

        // Stable sort keeps input order for fully tied requests.
        let mut order: Vec<usize> = (0..requests.len())
            .filter(|&i| !requests[i].is_wgrad)
            .collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (&requests[a].validity, &requests[b].validity);
            va.start.cmp(&vb.start).then(vb.end.cmp(&va.end))
        });

        let mut occupied: Vec<OccupiedRange> = Vec::new();
        let mut free: Vec<FreeRange> = Vec::new();
        let mut total = 0usize;

        for &idx in &order {
            let req = &requests[idx];
            reclaim_expired(&mut occupied, &mut free, req.validity.start);

            let offset = match first_fit(&mut free, req.size) {
                Some(offset) => offset,
                None => {
                    let offset = total;
                    total += req.size;
                    offset
                }
            };
            offsets[idx] = offset;
            occupied.push(OccupiedRange {
                offset,
                size: req.size,
                release_tick: req.validity.end,
            });
        }

        // Weight gradients live above the main arena's high-water mark
        // and never reuse ranges vacated below it; a slot is shared only
        // between wgrad requests with disjoint validities.
        let mut slots: Vec<WgradSlot> = Vec::new();
        for (idx, req) in requests.iter().enumerate().filter(|(_, r)| r.is_wgrad) {
            let fit = slots.iter_mut().find(|slot| {
                slot.size >= req.size && slot.spans.iter().all(|s| !s.overlaps(&req.validity))
            });
            match fit {
                Some(slot) => {
                    offsets[idx] = slot.offset;
                    slot.spans.push(req.validity);
                }
                None => {
                    offsets[idx] = total;
                    slots.push(WgradSlot {
                        offset: total,
                        size: req.size,
                        spans: vec![req.validity],
                    });
                    total += req.size;
                }
            }
        }

        tracing::debug!(
            requests = requests.len(),
            arena_bytes = total,
            "arena layout planned"
        );

        Ok(PlanResult {
            offsets,
            is_wgrad: requests.iter().map(|r| r.is_wgrad).collect(),
            total_size: total,
        })
    }
}

fn validate_requests(requests: &[MemoryRequest]) -> Result<(), PlanError> {
    for (index, req) in requests.iter().enumerate() {
        if req.size == 0 {
            return Err(PlanError::ZeroSize { index });
        }
        if req.validity.start >= req.validity.end {
            return Err(PlanError::InvertedValidity {
                index,
                start: req.validity.start,
                end: req.validity.end,
            });
        }
    }
    Ok(())
}

/// Move every occupied range whose release tick has passed into the
/// free list. Ranges releasing exactly at `tick` are reclaimable: the
/// end tick is exclusive.
fn reclaim_expired(occupied: &mut Vec<OccupiedRange>, free: &mut Vec<FreeRange>, tick: u64) {
    let mut i = 0;
    while i < occupied.len() {
        if occupied[i].release_tick <= tick {
            let expired = occupied.swap_remove(i);
            insert_free(
                free,
                FreeRange {
                    offset: expired.offset,
                    size: expired.size,
                },
            );
        } else {
            i += 1;
        }
    }
}

/// Insert into the offset-ordered free list, coalescing with both
/// neighbors when the ranges touch.
fn insert_free(free: &mut Vec<FreeRange>, range: FreeRange) {
    let pos = free.partition_point(|f| f.offset < range.offset);
    free.insert(pos, range);

    // Merge the successor first so `pos` stays valid.
    if pos + 1 < free.len() && free[pos].offset + free[pos].size == free[pos + 1].offset {
        free[pos].size += free[pos + 1].size;
        free.remove(pos + 1);
    }
    if pos > 0 && free[pos - 1].offset + free[pos - 1].size == free[pos].offset {
        free[pos - 1].size += free[pos].size;
        free.remove(pos);
    }
}

/// Take the lowest-offset free range that fits `size`, shrinking it in
/// place when it is larger than needed.
fn first_fit(free: &mut Vec<FreeRange>, size: usize) -> Option<usize> {
    let pos = free.iter().position(|f| f.size >= size)?;
    let offset = free[pos].offset;
    if free[pos].size == size {
        free.remove(pos);
    } else {
        free[pos].offset += size;
        free[pos].size -= size;
    }
    Some(offset)
}
