use crate::{
    bellatrix::containers::{ExecutionPayload, ExecutionPayloadHeader},
    phase0::primitives::H256,
};

impl ExecutionPayload {
    /// Builds the header a builder would commit to for this payload.
    ///
    /// `transactions_root` is taken as given because Merkleization is left to the caller.
    #[must_use]
    pub fn to_header(&self, transactions_root: H256) -> ExecutionPayloadHeader {
        let Self {
            parent_hash,
            fee_recipient,
            state_root,
            receipts_root,
            logs_bloom,
            prev_randao,
            block_number,
            gas_limit,
            gas_used,
            timestamp,
            ref extra_data,
            base_fee_per_gas,
            block_hash,
            transactions: _,
        } = *self;

        ExecutionPayloadHeader {
            parent_hash,
            fee_recipient,
            state_root,
            receipts_root,
            logs_bloom,
            prev_randao,
            block_number,
            gas_limit,
            gas_used,
            timestamp,
            extra_data: extra_data.clone(),
            base_fee_per_gas,
            block_hash,
            transactions_root,
        }
    }
}

impl ExecutionPayloadHeader {
    /// Checks every field the payload and the header have in common.
    #[must_use]
    pub fn commits_to(&self, payload: &ExecutionPayload) -> bool {
        payload.to_header(self.transactions_root) == *self
    }
}
