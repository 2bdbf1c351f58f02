//! Host-call surface: the fixed id → handler table and its dispatcher.

pub mod accumulate;
pub mod base;
pub mod general;

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::trace;

use crate::config::{HOST_CALL_BASE_GAS, REG_WHAT};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

fn registry() -> &'static HashMap<u8, Box<dyn HostCall>> {
    static REGISTRY: OnceLock<HashMap<u8, Box<dyn HostCall>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut m = HashMap::new();
        general::register(&mut m);
        accumulate::register(&mut m);
        m
    })
}

/// Handle one host call: charge the base gas, run the handler, or write
/// WHAT for an unknown id and continue.
pub fn dispatch(id: u64, ctx: &mut HostCallContext<'_>) -> HostOutcome {
    *ctx.gas -= HOST_CALL_BASE_GAS;
    if *ctx.gas < 0 {
        return HostOutcome::OutOfGas;
    }
    let handler = u8::try_from(id).ok().and_then(|id| registry().get(&id));
    match handler {
        Some(handler) => {
            trace!(service = ctx.service_id, call = handler.name(), "host call");
            handler.call(ctx)
        }
        None => {
            trace!(service = ctx.service_id, id, "unknown host call");
            ctx.set_result(REG_WHAT);
            HostOutcome::Continue
        }
    }
}
