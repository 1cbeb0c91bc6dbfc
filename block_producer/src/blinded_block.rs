use std::sync::Arc;

use types::{
    bellatrix::containers::ExecutionPayloadHeader,
    combined::{BeaconBlock, BlockSkeleton},
};

use crate::error::AssembleError;

/// Combines a block skeleton with a builder's header into an unsigned blinded block.
pub fn assemble_blinded_block(
    skeleton: Option<Arc<BlockSkeleton>>,
    header: Option<ExecutionPayloadHeader>,
) -> Result<BeaconBlock, AssembleError> {
    let skeleton = skeleton.ok_or(AssembleError::NilBlock)?;
    let header = header.ok_or(AssembleError::NilHeader)?;

    Ok(BeaconBlock::new(skeleton, header))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use types::phase0::primitives::H256;

    use super::*;

    fn skeleton() -> Arc<BlockSkeleton> {
        Arc::new(BlockSkeleton {
            slot: 3,
            proposer_index: 40,
            parent_root: H256::repeat_byte(1),
            ..BlockSkeleton::default()
        })
    }

    fn header() -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            block_number: 123,
            block_hash: H256::repeat_byte(2),
            ..ExecutionPayloadHeader::default()
        }
    }

    #[test]
    fn assembled_block_carries_header_and_skeleton() -> Result<(), AssembleError> {
        let skeleton = skeleton();
        let block = assemble_blinded_block(Some(Arc::clone(&skeleton)), Some(header()))?;

        assert!(block.is_blinded());
        assert!(Arc::ptr_eq(block.skeleton(), &skeleton));
        assert_eq!(block.execution_payload_header(), Some(&header()));

        Ok(())
    }

    #[test]
    fn assembly_is_deterministic() -> Result<(), AssembleError> {
        let first = assemble_blinded_block(Some(skeleton()), Some(header()))?;
        let second = assemble_blinded_block(Some(skeleton()), Some(header()))?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test_case(None, Some(header()) => Some(AssembleError::NilBlock); "missing block")]
    #[test_case(Some(skeleton()), None => Some(AssembleError::NilHeader); "missing header")]
    #[test_case(None, None => Some(AssembleError::NilBlock); "block is checked first")]
    fn missing_arguments_are_rejected(
        skeleton: Option<Arc<BlockSkeleton>>,
        header: Option<ExecutionPayloadHeader>,
    ) -> Option<AssembleError> {
        assemble_blinded_block(skeleton, header).err()
    }

    #[test]
    fn errors_use_nil_wording() {
        assert_eq!(AssembleError::NilBlock.to_string(), "nil block");
        assert_eq!(AssembleError::NilHeader.to_string(), "nil header");
    }
}
