//! WRITE (4): storage write in the invoking service.
//!
//! A0 = key offset, A1 = key length, A2 = value offset, A3 = value length
//! (NONE deletes). Yields the previous value length or NONE; FULL when the
//! grown footprint is unaffordable.

use crate::accounts::AccountError;
use crate::config::{HOST_WRITE, REG_FULL, REG_HUH, REG_NONE};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct WriteHostCall;

impl HostCall for WriteHostCall {
    fn id(&self) -> u8 {
        HOST_WRITE
    }
    fn name(&self) -> &'static str {
        "write"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let key = match ctx.read_memory(ctx.arg(0), ctx.arg(1)) {
            Ok(key) => key,
            Err(outcome) => return outcome,
        };
        let value = if ctx.arg(3) == REG_NONE {
            None
        } else {
            match ctx.read_memory(ctx.arg(2), ctx.arg(3)) {
                Ok(value) => Some(value),
                Err(outcome) => return outcome,
            }
        };
        let Some(account) = ctx.current_account_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        match account.write_storage(&key, value) {
            Ok(previous) => {
                let result = previous.map_or(REG_NONE, |len| len as u64);
                ctx.set_result(result);
            }
            Err(AccountError::InsufficientFunds) => ctx.set_result(REG_FULL),
            Err(AccountError::Huh) => ctx.set_result(REG_HUH),
        }
        HostOutcome::Continue
    }
}
