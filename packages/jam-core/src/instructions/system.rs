//! ECALLI and SBRK.

use crate::config::{OPCODE_ECALLI, OPCODE_SBRK};
use crate::instructions::base::{
    imm_unsigned, parse_two_regs, Control, ExecContext, InstructionHandler,
};

/// ECALLI: record the host-call id and suspend.
///
/// The program counter is left on the ecalli; the embedder advances past it
/// only after the host handler has run.
pub struct EcalliInstruction;

impl InstructionHandler for EcalliInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_ECALLI
    }
    fn name(&self) -> &'static str {
        "ECALLI"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        *ctx.host_call_id = imm_unsigned(ctx.operands, 0, ctx.skip.min(4));
        Control::Host
    }
}

/// SBRK: grow the heap by a page count, yielding the new upper bound.
pub struct SbrkInstruction;

impl InstructionHandler for SbrkInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_SBRK
    }
    fn name(&self) -> &'static str {
        "SBRK"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (dst, pages) = parse_two_regs(ctx.operands);
        let count = ctx.registers[pages] as u32;
        ctx.registers[dst] = u64::from(ctx.memory.sbrk(count));
        Control::Continue
    }
}
