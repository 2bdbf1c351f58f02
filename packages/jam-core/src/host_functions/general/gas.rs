//! GAS (0): write the remaining gas to the result register.

use crate::config::HOST_GAS;
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct GasHostCall;

impl HostCall for GasHostCall {
    fn id(&self) -> u8 {
        HOST_GAS
    }
    fn name(&self) -> &'static str {
        "gas"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        ctx.set_result((*ctx.gas).max(0) as u64);
        HostOutcome::Continue
    }
}
