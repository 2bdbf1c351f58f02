//! TRANSFER (20): enqueue a deferred transfer.
//!
//! A0 = destination, A1 = amount, A2 = gas limit, A3 = memo offset (128
//! bytes). WHO for an unknown destination, LOW when the gas limit is below
//! the destination's memo-gas floor, CASH when the sender cannot afford the
//! amount while staying solvent. On success the amount leaves the sender at
//! once and the gas limit is charged on top of the base cost; the transfer
//! itself fires after the batch.

use crate::config::{HOST_TRANSFER, MEMO_SIZE, REG_CASH, REG_HUH, REG_LOW, REG_OK, REG_WHO};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};
use crate::types::DeferredTransfer;

pub struct TransferHostCall;

impl HostCall for TransferHostCall {
    fn id(&self) -> u8 {
        HOST_TRANSFER
    }
    fn name(&self) -> &'static str {
        "transfer"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let memo_bytes = match ctx.read_memory(ctx.arg(3), MEMO_SIZE as u64) {
            Ok(bytes) => bytes,
            Err(outcome) => return outcome,
        };
        let amount = ctx.arg(1);
        let gas_limit = ctx.arg(2);

        let Some(dest) = u32::try_from(ctx.arg(0)).ok() else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let Some(dest_account) = ctx.account(dest) else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        if gas_limit < dest_account.min_memo_gas {
            ctx.set_result(REG_LOW);
            return HostOutcome::Continue;
        }

        let source = ctx.service_id;
        let Some(sender) = ctx.current_account_mut() else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        let remaining = sender.balance.checked_sub(amount);
        match remaining {
            Some(remaining) if remaining >= sender.min_balance() => {
                sender.balance = remaining;
            }
            _ => {
                ctx.set_result(REG_CASH);
                return HostOutcome::Continue;
            }
        }

        let mut memo = [0u8; MEMO_SIZE];
        memo.copy_from_slice(&memo_bytes);
        ctx.pair.regular.xfers.push(DeferredTransfer {
            source,
            dest,
            amount,
            memo,
            gas: gas_limit,
        });
        ctx.set_result(REG_OK);

        *ctx.gas -= i64::try_from(gas_limit).unwrap_or(i64::MAX);
        if *ctx.gas < 0 {
            return HostOutcome::OutOfGas;
        }
        HostOutcome::Continue
    }
}
