//! INFO (5): fetch an account header.
//!
//! A0 = service id (NONE = self), A1 = destination. Writes the canonical
//! header encoding and yields its length; NONE for an unknown service.

use crate::config::{HOST_INFO, REG_NONE};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};
use crate::state::encode_account_header;

pub struct InfoHostCall;

impl HostCall for InfoHostCall {
    fn id(&self) -> u8 {
        HOST_INFO
    }
    fn name(&self) -> &'static str {
        "info"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let header = ctx
            .resolve_service(ctx.arg(0))
            .and_then(|id| ctx.account(id))
            .map(encode_account_header);
        let Some(header) = header else {
            ctx.set_result(REG_NONE);
            return HostOutcome::Continue;
        };
        if let Err(outcome) = ctx.write_memory(ctx.arg(1), &header) {
            return outcome;
        }
        ctx.set_result(header.len() as u64);
        HostOutcome::Continue
    }
}
