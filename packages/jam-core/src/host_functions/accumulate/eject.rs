//! EJECT (21): destroy a child account.
//!
//! A0 = target id. Only the target's parent may eject it, and only while no
//! preimages are held for it; the child's balance folds into the caller.

use crate::config::{HOST_EJECT, REG_HUH, REG_OK, REG_WHO};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct EjectHostCall;

impl HostCall for EjectHostCall {
    fn id(&self) -> u8 {
        HOST_EJECT
    }
    fn name(&self) -> &'static str {
        "eject"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let Some(target) = u32::try_from(ctx.arg(0)).ok().filter(|&t| t != ctx.service_id)
        else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let Some(account) = ctx.account(target) else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        if account.parent != ctx.service_id {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        }
        if !account.preimages.is_empty() {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }

        let balance = account.balance;
        ctx.pair.regular.state.accounts.remove(&target);
        if let Some(caller) = ctx.current_account_mut() {
            caller.balance = caller.balance.saturating_add(balance);
        }
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}
