//! Control flow: TRAP, FALLTHROUGH, HALT, JUMP, JUMP_IND.

use crate::config::{OPCODE_FALLTHROUGH, OPCODE_HALT, OPCODE_JUMP, OPCODE_JUMP_IND, OPCODE_TRAP, RETURN_SENTINEL};
use crate::instructions::base::{
    imm_unsigned, parse_reg_imm, Control, ExecContext, InstructionHandler,
};

/// TRAP: the explicit panic opcode.
pub struct TrapInstruction;

impl InstructionHandler for TrapInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_TRAP
    }
    fn name(&self) -> &'static str {
        "TRAP"
    }
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Control {
        Control::Panic
    }
}

/// FALLTHROUGH: no-op basic-block boundary.
pub struct FallthroughInstruction;

impl InstructionHandler for FallthroughInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_FALLTHROUGH
    }
    fn name(&self) -> &'static str {
        "FALLTHROUGH"
    }
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Control {
        Control::Continue
    }
}

/// HALT: the only normal program exit.
pub struct HaltInstruction;

impl InstructionHandler for HaltInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_HALT
    }
    fn name(&self) -> &'static str {
        "HALT"
    }
    fn execute(&self, _ctx: &mut ExecContext<'_>) -> Control {
        Control::Halt
    }
}

/// JUMP: unconditional transfer through a jump-table index.
pub struct JumpInstruction;

impl InstructionHandler for JumpInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_JUMP
    }
    fn name(&self) -> &'static str {
        "JUMP"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let index = imm_unsigned(ctx.operands, 0, ctx.skip.min(4));
        match ctx.program.jump_target(index) {
            Some(target) => Control::Jump(target),
            None => Control::Fault(ctx.pc),
        }
    }
}

/// JUMP_IND: dynamic jump through `(reg + imm) mod 2^32`.
///
/// The return sentinel halts. Otherwise the address must be non-zero, even,
/// and `addr / 2 - 1` must name a jump-table entry whose target is an
/// instruction head; anything else faults.
pub struct JumpIndInstruction;

impl InstructionHandler for JumpIndInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_JUMP_IND
    }
    fn name(&self) -> &'static str {
        "JUMP_IND"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (reg, imm) = parse_reg_imm(ctx.operands, ctx.skip);
        let address = ctx.registers[reg].wrapping_add(imm as u64) & 0xffff_ffff;
        if address == u64::from(RETURN_SENTINEL) {
            return Control::Halt;
        }
        if address == 0 || address % 2 != 0 {
            return Control::Fault(ctx.pc);
        }
        match ctx.program.jump_target(address / 2 - 1) {
            Some(target) => Control::Jump(target),
            None => Control::Fault(ctx.pc),
        }
    }
}
