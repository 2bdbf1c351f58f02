//! NEW (18): create a child service account.
//!
//! A0 = code-hash offset, A1 = code length, A2 = min accumulate gas,
//! A3 = min memo gas, A4 = gratis. The child starts with a solicited request
//! for its code preimage and an endowment equal to its minimum balance,
//! paid by the creator. Yields the new service id.

use crate::accounts::{PreimageRequest, ServiceAccount};
use crate::config::{
    HOST_NEW, MAX_SERVICE_CODE_SIZE, MIN_PUBLIC_SERVICE_ID, REG_CASH, REG_HUH, REG_WHO,
};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct NewHostCall;

impl HostCall for NewHostCall {
    fn id(&self) -> u8 {
        HOST_NEW
    }
    fn name(&self) -> &'static str {
        "new"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let code_hash = match ctx.read_hash(ctx.arg(0)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        let code_len = ctx.arg(1);
        if code_len > MAX_SERVICE_CODE_SIZE {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let gratis = ctx.arg(4);
        if gratis != 0 && ctx.service_id != ctx.slot_roles.manager {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        }

        let mut child = ServiceAccount::new(code_hash, ctx.service_id, ctx.timeslot);
        child.min_acc_gas = ctx.arg(2);
        child.min_memo_gas = ctx.arg(3);
        child.gratis = gratis;
        child
            .requests
            .insert((code_hash, code_len), PreimageRequest::default());
        let endowment = child.min_balance();
        child.balance = endowment;

        let Some(creator) = ctx.current_account_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        let remaining = creator.balance.checked_sub(endowment);
        match remaining {
            Some(remaining) if remaining >= creator.min_balance() => {
                creator.balance = remaining;
            }
            _ => {
                ctx.set_result(REG_CASH);
                return HostOutcome::Continue;
            }
        }

        let state = &mut ctx.pair.regular.state;
        let mut id = state.next_free_id.max(MIN_PUBLIC_SERVICE_ID);
        while state.accounts.contains_key(&id) {
            id = id.checked_add(1).unwrap_or(MIN_PUBLIC_SERVICE_ID);
        }
        state.next_free_id = id.checked_add(1).unwrap_or(MIN_PUBLIC_SERVICE_ID);
        state.accounts.insert(id, child);

        ctx.set_result(u64::from(id));
        HostOutcome::Continue
    }
}
