//! Privileged-state updates: BLESS (14), ASSIGN (15), DESIGNATE (16),
//! AUTO_ACCUMULATE (27).
//!
//! Each call is rejected with HUH unless the invoker holds the matching
//! role. Successful updates land in the regular implications and take effect
//! at the timeslot boundary with the rest of the commit.

use crate::config::{
    HOST_ASSIGN, HOST_AUTO_ACCUMULATE, HOST_BLESS, HOST_DESIGNATE, REG_CORE, REG_HUH, REG_OK,
    REG_WHO, VALIDATOR_KEY_SIZE,
};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};
use crate::types::{Hash, ServiceId};

/// Cap on the always-access list accepted in one call.
const MAX_ALWAYS_ACCESS: u64 = 1024;

/// BLESS: A0 = new manager, A1 = new delegator, A2 = new registrar,
/// A3 = offset of the per-core assigner array (4 bytes each). Manager only.
pub struct BlessHostCall;

impl HostCall for BlessHostCall {
    fn id(&self) -> u8 {
        HOST_BLESS
    }
    fn name(&self) -> &'static str {
        "bless"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        if ctx.service_id != ctx.slot_roles.manager {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let roles: Option<Vec<ServiceId>> = (0..3)
            .map(|i| u32::try_from(ctx.arg(i)).ok())
            .collect();
        let Some(roles) = roles else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let cores = usize::from(ctx.config.core_count);
        let raw = match ctx.read_memory(ctx.arg(3), 4 * cores as u64) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        let assigners: Vec<ServiceId> = raw
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().expect("4 bytes")))
            .collect();

        let privileged = &mut ctx.pair.regular.state.privileged;
        privileged.manager = roles[0];
        privileged.delegator = roles[1];
        privileged.registrar = roles[2];
        privileged.assigners = assigners;
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}

/// ASSIGN: A0 = core, A1 = offset of the new authorizer queue (32-byte
/// hashes), A2 = the core's next assigner. Only the core's current assigner.
pub struct AssignHostCall;

impl HostCall for AssignHostCall {
    fn id(&self) -> u8 {
        HOST_ASSIGN
    }
    fn name(&self) -> &'static str {
        "assign"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let core = ctx.arg(0);
        if core >= u64::from(ctx.config.core_count) {
            ctx.set_result(REG_CORE);
            return HostOutcome::Continue;
        }
        let core = core as usize;
        if ctx.slot_roles.assigners.get(core) != Some(&ctx.service_id) {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let Some(next_assigner) = u32::try_from(ctx.arg(2)).ok() else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };
        let queue_len = ctx.config.auth_queue_size;
        let raw = match ctx.read_memory(ctx.arg(1), 32 * queue_len as u64) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        let queue: Vec<Hash> = raw
            .chunks_exact(32)
            .map(|c| c.try_into().expect("32 bytes"))
            .collect();

        let privileged = &mut ctx.pair.regular.state.privileged;
        privileged.auth_queue[core] = queue;
        privileged.assigners[core] = next_assigner;
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}

/// DESIGNATE: A0 = offset of the full staging set (336-byte validator
/// descriptors). Delegator only.
pub struct DesignateHostCall;

impl HostCall for DesignateHostCall {
    fn id(&self) -> u8 {
        HOST_DESIGNATE
    }
    fn name(&self) -> &'static str {
        "designate"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        if ctx.service_id != ctx.slot_roles.delegator {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let count = usize::from(ctx.config.validator_count);
        let raw = match ctx.read_memory(ctx.arg(0), (VALIDATOR_KEY_SIZE * count) as u64) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        ctx.pair.regular.state.privileged.staging_set = raw
            .chunks_exact(VALIDATOR_KEY_SIZE)
            .map(<[u8]>::to_vec)
            .collect();
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}

/// AUTO_ACCUMULATE: A0 = offset of (service id, gas) entries (4 + 8 bytes
/// each), A1 = entry count. Replaces the always-access list. Manager only.
pub struct AutoAccumulateHostCall;

impl HostCall for AutoAccumulateHostCall {
    fn id(&self) -> u8 {
        HOST_AUTO_ACCUMULATE
    }
    fn name(&self) -> &'static str {
        "auto_accumulate"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        if ctx.service_id != ctx.slot_roles.manager {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let count = ctx.arg(1);
        if count > MAX_ALWAYS_ACCESS {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        }
        let raw = match ctx.read_memory(ctx.arg(0), 12 * count) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        ctx.pair.regular.state.privileged.always_access = raw
            .chunks_exact(12)
            .map(|entry| {
                let service = u32::from_le_bytes(entry[..4].try_into().expect("4 bytes"));
                let gas = u64::from_le_bytes(entry[4..].try_into().expect("8 bytes"));
                (service, gas)
            })
            .collect();
        ctx.set_result(REG_OK);
        HostOutcome::Continue
    }
}
