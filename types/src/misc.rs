use crate::phase0::{
    consts::SLOTS_PER_EPOCH,
    primitives::{Epoch, Slot},
};

#[must_use]
pub const fn compute_start_slot_at_epoch(epoch: Epoch) -> Slot {
    epoch.saturating_mul(SLOTS_PER_EPOCH)
}
