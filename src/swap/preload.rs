//! Preload table for inference-mode weight streaming.
//!
//! Maps stable weight identifiers to the byte ranges a previous run
//! persisted in the backing file, so inference can stream weights
//! straight into caller-owned buffers without leaving mappings live.

use std::collections::HashMap;

/// Stable identifier for a persisted weight region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightId(pub u32);

/// Location of one weight region in the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadEntry {
    /// Byte offset in the backing file.
    pub offset: u64,
    /// Length in bytes.
    pub len: usize,
}

/// Lookup table populated once during inference setup.
#[derive(Debug, Default, Clone)]
pub struct WeightPreloadTable {
    entries: HashMap<WeightId, PreloadEntry>,
}

impl WeightPreloadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where a weight region lives in the backing file.
    pub fn insert(&mut self, id: WeightId, offset: u64, len: usize) {
        self.entries.insert(id, PreloadEntry { offset, len });
    }

    pub fn get(&self, id: WeightId) -> Option<PreloadEntry> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_looked_up_by_id() {
        let mut table = WeightPreloadTable::new();
        table.insert(WeightId(3), 4096, 512);

        assert_eq!(
            table.get(WeightId(3)),
            Some(PreloadEntry { offset: 4096, len: 512 })
        );
        assert_eq!(table.get(WeightId(4)), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn reinserting_an_id_replaces_its_entry() {
        let mut table = WeightPreloadTable::new();
        table.insert(WeightId(1), 0, 64);
        table.insert(WeightId(1), 128, 32);

        assert_eq!(
            table.get(WeightId(1)),
            Some(PreloadEntry { offset: 128, len: 32 })
        );
        assert_eq!(table.len(), 1);
    }
}
