//! CHECKPOINT (17): copy the regular implications into the exceptional
//! dimension, pinning the rollback point for a later panic or gas
//! exhaustion. Yields the remaining gas, like GAS.

use crate::config::HOST_CHECKPOINT;
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct CheckpointHostCall;

impl HostCall for CheckpointHostCall {
    fn id(&self) -> u8 {
        HOST_CHECKPOINT
    }
    fn name(&self) -> &'static str {
        "checkpoint"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        ctx.pair.checkpoint();
        ctx.set_result((*ctx.gas).max(0) as u64);
        HostOutcome::Continue
    }
}
