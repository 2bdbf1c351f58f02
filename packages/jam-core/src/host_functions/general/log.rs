//! LOG (100): guest diagnostics, forwarded to the tracing subscriber.
//!
//! A0 = level, A1 = message offset, A2 = message length.

use tracing::debug;

use crate::config::{HOST_LOG, REG_OK};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

pub struct LogHostCall;

impl HostCall for LogHostCall {
    fn id(&self) -> u8 {
        HOST_LOG
    }
    fn name(&self) -> &'static str {
        "log"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let message = match ctx.read_memory(ctx.arg(1), ctx.arg(2)) {
            Ok(message) => message,
            Err(outcome) => return outcome,
        };
        debug!(
            service = ctx.service_id,
            level = ctx.arg(0),
            message = %String::from_utf8_lossy(&message),
            "guest log"
        );
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}
