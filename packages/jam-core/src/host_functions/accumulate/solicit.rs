//! SOLICIT (23): request a preimage.
//!
//! A0 = hash offset, A1 = preimage length. FULL when the grown footprint is
//! unaffordable; HUH when the request is in no applicable state.

use crate::accounts::AccountError;
use crate::config::{HOST_SOLICIT, REG_FULL, REG_HUH, REG_OK};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct SolicitHostCall;

impl HostCall for SolicitHostCall {
    fn id(&self) -> u8 {
        HOST_SOLICIT
    }
    fn name(&self) -> &'static str {
        "solicit"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let hash = match ctx.read_hash(ctx.arg(0)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        let len = ctx.arg(1);
        let slot = ctx.timeslot;
        let Some(account) = ctx.current_account_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        match account.solicit(hash, len, slot) {
            Ok(()) => ctx.set_result(REG_OK),
            Err(AccountError::InsufficientFunds) => ctx.set_result(REG_FULL),
            Err(AccountError::Huh) => ctx.set_result(REG_HUH),
        }
        HostOutcome::Continue
    }
}
