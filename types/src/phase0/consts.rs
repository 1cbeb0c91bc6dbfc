pub const SLOTS_PER_EPOCH: u64 = 32;
