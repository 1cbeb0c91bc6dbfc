pub use crate::{
    execution_engine::{ExecutionEngine, MockExecutionEngine, NullExecutionEngine},
    types::{PayloadAttributes, PayloadId},
};

mod execution_engine;
mod types;
