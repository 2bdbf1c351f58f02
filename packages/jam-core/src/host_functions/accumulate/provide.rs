//! PROVIDE (26): offer a preimage to a soliciting service.
//!
//! A0 = target service id (NONE = self), A1 = blob offset, A2 = blob length.
//! The target must hold the matching request in the unprovided state; the
//! provision itself is applied at end of timeslot.

use crate::config::{HOST_PROVIDE, REG_HUH, REG_OK, REG_WHO};
use crate::crypto::blake2b256;
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct ProvideHostCall;

impl HostCall for ProvideHostCall {
    fn id(&self) -> u8 {
        HOST_PROVIDE
    }
    fn name(&self) -> &'static str {
        "provide"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let blob = match ctx.read_memory(ctx.arg(1), ctx.arg(2)) {
            Ok(blob) => blob,
            Err(outcome) => return outcome,
        };
        let Some(target) = ctx.resolve_service(ctx.arg(0)) else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let Some(account) = ctx.account(target) else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let key = (blake2b256(&blob), blob.len() as u64);
        let unprovided = account.requests.get(&key).is_some_and(|r| r.0.is_empty());
        if !unprovided {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        ctx.pair.regular.provisions.push((target, blob));
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}
