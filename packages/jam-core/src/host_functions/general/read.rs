//! READ (3): storage read from the invoking or a named service.
//!
//! A0 = service id (NONE = self), A1 = key offset, A2 = key length,
//! A3 = destination, A4 = byte cap. Yields the value length, or NONE when
//! the service or key is unknown.

use crate::config::{HOST_READ, REG_NONE};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct ReadHostCall;

impl HostCall for ReadHostCall {
    fn id(&self) -> u8 {
        HOST_READ
    }
    fn name(&self) -> &'static str {
        "read"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let key = match ctx.read_memory(ctx.arg(1), ctx.arg(2)) {
            Ok(key) => key,
            Err(outcome) => return outcome,
        };
        let value = ctx
            .resolve_service(ctx.arg(0))
            .and_then(|id| ctx.account(id))
            .and_then(|account| account.storage.get(&key))
            .cloned();
        let Some(value) = value else {
            ctx.set_result(REG_NONE);
            return HostOutcome::Continue;
        };
        let len = (ctx.arg(4) as usize).min(value.len());
        if let Err(outcome) = ctx.write_memory(ctx.arg(3), &value[..len]) {
            return outcome;
        }
        ctx.set_result(value.len() as u64);
        HostOutcome::Continue
    }
}
