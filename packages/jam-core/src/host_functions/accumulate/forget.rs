//! FORGET (24): drop a preimage request.
//!
//! A0 = hash offset, A1 = preimage length. HUH when the request is unknown
//! or its preimage has not yet expired.

use crate::config::{HOST_FORGET, REG_HUH, REG_OK};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct ForgetHostCall;

impl HostCall for ForgetHostCall {
    fn id(&self) -> u8 {
        HOST_FORGET
    }
    fn name(&self) -> &'static str {
        "forget"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let hash = match ctx.read_hash(ctx.arg(0)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        let len = ctx.arg(1);
        let slot = ctx.timeslot;
        let expiry = ctx.config.preimage_expiry;
        let Some(account) = ctx.current_account_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        match account.forget(hash, len, slot, expiry) {
            Ok(()) => ctx.set_result(REG_OK),
            Err(_) => ctx.set_result(REG_HUH),
        }
        HostOutcome::Continue
    }
}
