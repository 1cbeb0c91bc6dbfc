use std::collections::BTreeMap;

use execution_engine::PayloadId;
use parking_lot::Mutex;
use types::phase0::primitives::{Slot, ValidatorIndex};

/// Payload IDs of builds started ahead of proposals, keyed by slot and proposer.
///
/// Entries are ordered by slot so that pruning does not have to scan the whole map.
#[derive(Default)]
pub struct PayloadIdCache {
    entries: Mutex<BTreeMap<(Slot, ValidatorIndex), PayloadId>>,
}

impl PayloadIdCache {
    pub fn set(&self, slot: Slot, proposer_index: ValidatorIndex, payload_id: PayloadId) {
        self.entries
            .lock()
            .insert((slot, proposer_index), payload_id);
    }

    #[must_use]
    pub fn get(&self, slot: Slot, proposer_index: ValidatorIndex) -> Option<PayloadId> {
        self.entries.lock().get(&(slot, proposer_index)).copied()
    }

    /// Removes entries for slots before `before_slot`. Returns the number of removed entries.
    pub fn prune(&self, before_slot: Slot) -> usize {
        let mut entries = self.entries.lock();
        let retained = entries.split_off(&(before_slot, ValidatorIndex::MIN));
        let removed = entries.len();
        *entries = retained;
        removed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
