//! EXPORT (7): copy bytes out as an erasure segment. Refinement only.
//!
//! A0 = data offset, A1 = length (at most one segment). The blob is
//! zero-padded to the segment size; yields the new segment's index.

use crate::config::{HOST_EXPORT, REG_FULL, REG_HUH, REG_OOB, SEGMENT_SIZE};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

/// Export count cap per refinement.
const MAX_EXPORTS: usize = 3072;

pub struct ExportHostCall;

impl HostCall for ExportHostCall {
    fn id(&self) -> u8 {
        HOST_EXPORT
    }
    fn name(&self) -> &'static str {
        "export"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        if ctx.arg(1) > SEGMENT_SIZE as u64 {
            ctx.set_result(REG_OOB);
            return HostOutcome::Continue;
        }
        let data = match ctx.read_memory(ctx.arg(0), ctx.arg(1)) {
            Ok(data) => data,
            Err(outcome) => return outcome,
        };
        let Some(exports) = ctx.exports.as_deref_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        if exports.len() >= MAX_EXPORTS {
            ctx.set_result(REG_FULL);
            return HostOutcome::Continue;
        }
        let mut segment = data;
        segment.resize(SEGMENT_SIZE, 0);
        exports.push(segment);
        let index = exports.len() as u64 - 1;
        ctx.set_result(index);
        HostOutcome::Continue
    }
}
