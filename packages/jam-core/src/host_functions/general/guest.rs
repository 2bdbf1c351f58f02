//! MACHINE (8), INVOKE (12), EXPUNGE (13): nested guest PVMs.
//!
//! A guest owns fully disjoint memory built from its own program blob; its
//! gas is charged to the parent at each invocation boundary.

use crate::config::{HOST_EXPUNGE, HOST_INVOKE, HOST_MACHINE, NUM_REGISTERS, REG_A1, REG_HUH, REG_WHO};
use crate::host_functions::base::{HostCall, HostCallContext, HostOutcome};
use crate::parser::Program;
use crate::pvm::Pvm;
use crate::types::Status;

/// MACHINE: A0 = program offset, A1 = program length, A2 = initial pc.
/// Yields the new machine id; an unparseable program yields HUH.
pub struct MachineHostCall;

impl HostCall for MachineHostCall {
    fn id(&self) -> u8 {
        HOST_MACHINE
    }
    fn name(&self) -> &'static str {
        "machine"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let blob = match ctx.read_memory(ctx.arg(0), ctx.arg(1)) {
            Ok(blob) => blob,
            Err(outcome) => return outcome,
        };
        let Ok(program) = Program::parse(&blob) else {
            ctx.set_result(REG_HUH);
            return HostOutcome::Continue;
        };
        let mut vm = Pvm::new(program, 0);
        vm.pc = ctx.arg(2) as u32;
        let id = ctx.guests.add(vm);
        ctx.set_result(id);
        HostOutcome::Continue
    }
}

/// INVOKE: A0 = machine id, A1 = state-block offset. The block is the
/// guest's gas (8 bytes) followed by its 13 registers; it is read before and
/// written back after the run. Yields the guest's status code, with the
/// pending host-call id in A1 when the guest suspended.
pub struct InvokeHostCall;

const STATE_BLOCK_LEN: usize = 8 + 8 * NUM_REGISTERS;

impl HostCall for InvokeHostCall {
    fn id(&self) -> u8 {
        HOST_INVOKE
    }
    fn name(&self) -> &'static str {
        "invoke"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        let block_offset = ctx.arg(1);
        let block = match ctx.read_memory(block_offset, STATE_BLOCK_LEN as u64) {
            Ok(block) => block,
            Err(outcome) => return outcome,
        };
        let id = ctx.arg(0);
        let Some(guest) = ctx.guests.get_mut(id) else {
            ctx.set_result(REG_WHO);
            return HostOutcome::Continue;
        };

        let granted = i64::from_le_bytes(block[..8].try_into().expect("8 bytes"));
        guest.gas = granted.max(0);
        for (i, chunk) in block[8..].chunks_exact(8).enumerate() {
            guest.registers[i] = u64::from_le_bytes(chunk.try_into().expect("8 bytes"));
        }
        if guest.status() == Status::Host {
            guest.resume_after_host();
        }
        let status = guest.run();

        let mut block = Vec::with_capacity(STATE_BLOCK_LEN);
        block.extend_from_slice(&guest.gas.max(0).to_le_bytes());
        for &reg in guest.registers.iter() {
            block.extend_from_slice(&reg.to_le_bytes());
        }
        let consumed = granted.max(0) - guest.gas.max(0);
        let host_call_id = guest.host_call_id();

        *ctx.gas -= consumed;
        if *ctx.gas < 0 {
            return HostOutcome::OutOfGas;
        }
        if let Err(outcome) = ctx.write_memory(block_offset, &block) {
            return outcome;
        }
        ctx.set_result(u64::from(status.code()));
        if status == Status::Host {
            ctx.registers[REG_A1] = host_call_id;
        }
        HostOutcome::Continue
    }
}

/// EXPUNGE: A0 = machine id. Destroys the guest, yielding its final program
/// counter; an unknown id yields WHO.
pub struct ExpungeHostCall;

impl HostCall for ExpungeHostCall {
    fn id(&self) -> u8 {
        HOST_EXPUNGE
    }
    fn name(&self) -> &'static str {
        "expunge"
    }
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome {
        match ctx.guests.remove(ctx.arg(0)) {
            Some(guest) => {
                ctx.set_result(u64::from(guest.pc));
                HostOutcome::Continue
            }
            None => {
                ctx.set_result(REG_WHO);
                HostOutcome::Continue
            }
        }
    }
}
