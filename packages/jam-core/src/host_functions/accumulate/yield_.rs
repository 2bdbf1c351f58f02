//! YIELD (25): set the accumulation yield hash.
//!
//! A0 = offset of the 32-byte hash.

use crate::config::{HOST_YIELD, REG_OK};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct YieldHostCall;

impl HostCall for YieldHostCall {
    fn id(&self) -> u8 {
        HOST_YIELD
    }
    fn name(&self) -> &'static str {
        "yield"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let hash = match ctx.read_hash(ctx.arg(0)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        ctx.pair.regular.yield_hash = Some(hash);
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}
