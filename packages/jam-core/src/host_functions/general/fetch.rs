//! FETCH (1): read an environment blob by discriminator.
//!
//! A0 = destination offset, A1 = offset into the blob, A2 = byte cap,
//! A3 = discriminator. Writes `min(cap, len − offset)` bytes and yields the
//! blob's full length; an unavailable discriminator yields NONE.

use crate::codec::encode_natural;
use crate::config::{
    BASE_DEPOSIT, BYTE_DEPOSIT, EC_DATA_SEGMENTS, EC_TOTAL_SEGMENTS, HOST_FETCH, ITEM_DEPOSIT,
    MEMO_SIZE, MIN_PUBLIC_SERVICE_ID, REG_NONE, SEGMENT_SIZE,
};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};

/// System constants (discriminator 0).
pub const FETCH_CONSTANTS: u64 = 0;
/// Entropy accumulator (discriminator 1).
pub const FETCH_ENTROPY: u64 = 1;
/// Encoded work package under accumulation (discriminator 2).
pub const FETCH_WORK_PACKAGE: u64 = 2;
/// Recent block hashes, newest last (discriminator 3).
pub const FETCH_RECENT_BLOCKS: u64 = 3;

pub struct FetchHostCall;

fn encode_constants(ctx: &HostCallContext<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    for value in [
        BASE_DEPOSIT,
        ITEM_DEPOSIT,
        BYTE_DEPOSIT,
        u64::from(ctx.config.core_count),
        u64::from(ctx.config.validator_count),
        ctx.config.auth_queue_size as u64,
        u64::from(ctx.config.preimage_expiry),
        u64::from(ctx.config.epoch_duration),
        u64::from(ctx.config.slot_duration),
        ctx.config.max_block_gas,
        SEGMENT_SIZE as u64,
        EC_DATA_SEGMENTS as u64,
        EC_TOTAL_SEGMENTS as u64,
        MEMO_SIZE as u64,
        u64::from(MIN_PUBLIC_SERVICE_ID),
    ] {
        out.extend(encode_natural(value));
    }
    out
}

impl HostCall for FetchHostCall {
    fn id(&self) -> u8 {
        HOST_FETCH
    }
    fn name(&self) -> &'static str {
        "fetch"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let dest = ctx.arg(0);
        let from = ctx.arg(1);
        let cap = ctx.arg(2);

        let data: Option<Vec<u8>> = match ctx.arg(3) {
            FETCH_CONSTANTS => Some(encode_constants(ctx)),
            FETCH_ENTROPY => Some(ctx.entropy.to_vec()),
            FETCH_WORK_PACKAGE => ctx.work_package.map(<[u8]>::to_vec),
            FETCH_RECENT_BLOCKS => {
                Some(ctx.recent_blocks.iter().flat_map(|h| h.to_vec()).collect())
            }
            _ => None,
        };
        let Some(data) = data else {
            ctx.set_result(REG_NONE);
            return HostOutcome::Continue;
        };

        let from = (from as usize).min(data.len());
        let len = (cap as usize).min(data.len() - from);
        if let Err(outcome) = ctx.write_memory(dest, &data[from..from + len]) {
            return outcome;
        }
        ctx.set_result(data.len() as u64);
        HostOutcome::Continue
    }
}
