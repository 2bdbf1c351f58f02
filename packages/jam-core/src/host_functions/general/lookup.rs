//! LOOKUP (2): preimage lookup in the invoking or a named service.
//!
//! A0 = service id (NONE = self), A1 = hash offset, A2 = destination,
//! A3 = byte cap. Yields the preimage length, or NONE when the service or
//! preimage is unknown.

use crate::config::{HOST_LOOKUP, REG_NONE};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct LookupHostCall;

impl HostCall for LookupHostCall {
    fn id(&self) -> u8 {
        HOST_LOOKUP
    }
    fn name(&self) -> &'static str {
        "lookup"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let hash = match ctx.read_hash(ctx.arg(1)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        let blob = ctx
            .resolve_service(ctx.arg(0))
            .and_then(|id| ctx.account(id))
            .and_then(|account| account.preimages.get(&hash))
            .cloned();
        let Some(blob) = blob else {
            ctx.set_result(REG_NONE);
            return HostOutcome::Continue;
        };
        let len = (ctx.arg(3) as usize).min(blob.len());
        if let Err(outcome) = ctx.write_memory(ctx.arg(2), &blob[..len]) {
            return outcome;
        }
        ctx.set_result(blob.len() as u64);
        HostOutcome::Continue
    }
}
