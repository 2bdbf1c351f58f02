//! Loads, stores, and immediate loads.
//!
//! Absolute forms address memory by immediate; indirect forms add a signed
//! immediate to a base register. Narrow loads zero- or sign-extend per
//! opcode; all accesses are little-endian. A memory fault carries the
//! offending page address.

use crate::instructions::base::{
    imm_len, imm_unsigned, parse_reg_imm, parse_two_regs_imm, reg_low, sign_extend, Control,
    ExecContext, InstructionHandler,
};

/// LOAD_IMM: `reg = sign-extended immediate`.
pub struct LoadImmInstruction;

impl InstructionHandler for LoadImmInstruction {
    fn opcode(&self) -> u8 {
        crate::config::OPCODE_LOAD_IMM
    }
    fn name(&self) -> &'static str {
        "LOAD_IMM"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (reg, imm) = parse_reg_imm(ctx.operands, ctx.skip);
        ctx.registers[reg] = imm as u64;
        Control::Continue
    }
}

/// LOAD_IMM_64: `reg = full 8-byte immediate`.
pub struct LoadImm64Instruction;

impl InstructionHandler for LoadImm64Instruction {
    fn opcode(&self) -> u8 {
        crate::config::OPCODE_LOAD_IMM_64
    }
    fn name(&self) -> &'static str {
        "LOAD_IMM_64"
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let reg = reg_low(ctx.operands.first().copied().unwrap_or(0));
        ctx.registers[reg] = imm_unsigned(ctx.operands, 1, 8);
        Control::Continue
    }
}

/// Memory load family: absolute or base+offset, width 1/2/4/8, optionally
/// sign-extending.
pub struct LoadOp {
    opcode: u8,
    name: &'static str,
    width: u32,
    signed: bool,
    indirect: bool,
}

impl LoadOp {
    #[must_use]
    pub const fn new(
        opcode: u8,
        name: &'static str,
        width: u32,
        signed: bool,
        indirect: bool,
    ) -> Self {
        Self { opcode, name, width, signed, indirect }
    }
}

impl InstructionHandler for LoadOp {
    fn opcode(&self) -> u8 {
        self.opcode
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (dst, address) = if self.indirect {
            let (dst, base, offset) = parse_two_regs_imm(ctx.operands, ctx.skip);
            (dst, ctx.registers[base].wrapping_add(offset as u64) as u32)
        } else {
            let reg = reg_low(ctx.operands.first().copied().unwrap_or(0));
            (reg, imm_unsigned(ctx.operands, 1, imm_len(ctx.skip)) as u32)
        };
        match ctx.memory.load(address, self.width) {
            Ok(raw) => {
                ctx.registers[dst] = if self.signed {
                    sign_extend(raw, self.width)
                } else {
                    raw
                };
                Control::Continue
            }
            Err(fault) => Control::Fault(fault),
        }
    }
}

/// Memory store family: absolute or base+offset, width 1/2/4/8.
pub struct StoreOp {
    opcode: u8,
    name: &'static str,
    width: u32,
    indirect: bool,
}

impl StoreOp {
    #[must_use]
    pub const fn new(opcode: u8, name: &'static str, width: u32, indirect: bool) -> Self {
        Self { opcode, name, width, indirect }
    }
}

impl InstructionHandler for StoreOp {
    fn opcode(&self) -> u8 {
        self.opcode
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (src, address) = if self.indirect {
            let (src, base, offset) = parse_two_regs_imm(ctx.operands, ctx.skip);
            (src, ctx.registers[base].wrapping_add(offset as u64) as u32)
        } else {
            let reg = reg_low(ctx.operands.first().copied().unwrap_or(0));
            (reg, imm_unsigned(ctx.operands, 1, imm_len(ctx.skip)) as u32)
        };
        match ctx.memory.store(address, ctx.registers[src], self.width) {
            Ok(()) => Control::Continue,
            Err(fault) => Control::Fault(fault),
        }
    }
}
