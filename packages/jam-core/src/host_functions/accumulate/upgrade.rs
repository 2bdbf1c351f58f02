//! UPGRADE (19): replace the invoking service's code hash.
//!
//! A0 = offset of the new code hash.

use crate::config::{HOST_UPGRADE, REG_HUH, REG_OK};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct UpgradeHostCall;

impl HostCall for UpgradeHostCall {
    fn id(&self) -> u8 {
        HOST_UPGRADE
    }
    fn name(&self) -> &'static str {
        "upgrade"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let code_hash = match ctx.read_hash(ctx.arg(0)) {
            Ok(hash) => hash,
            Err(outcome) => return outcome,
        };
        match ctx.current_account_mut() {
            Some(account) => {
                account.code_hash = code_hash;
                ctx.set_result(REG_OK);
            }
            None => ctx.set_result(REG_HUH),
        }
        HostOutcome::Continue
    }
}
