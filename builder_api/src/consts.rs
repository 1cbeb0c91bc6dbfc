/// Seconds a proposer may wait for a header before the proposal is late.
pub const BUILDER_PROPOSAL_DELAY_TOLERANCE: u64 = 1;
