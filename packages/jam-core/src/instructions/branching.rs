//! Conditional branches.
//!
//! A branch carries a jump-table index, not a code offset: when the condition
//! holds, the target is read from the program's jump table and must land on
//! an instruction head, otherwise the machine faults.

use crate::instructions::base::{
    parse_reg_imm_index, parse_two_regs_index, Control, ExecContext, InstructionHandler,
};

fn take_branch(ctx: &ExecContext<'_>, index: u64) -> Control {
    match ctx.program.jump_target(index) {
        Some(target) => Control::Jump(target),
        None => Control::Fault(ctx.pc),
    }
}

/// Branch comparing one register against a sign-extended immediate.
pub struct BranchImmOp {
    opcode: u8,
    name: &'static str,
    cond: fn(u64, i64) -> bool,
}

impl BranchImmOp {
    #[must_use]
    pub const fn new(opcode: u8, name: &'static str, cond: fn(u64, i64) -> bool) -> Self {
        Self { opcode, name, cond }
    }
}

impl InstructionHandler for BranchImmOp {
    fn opcode(&self) -> u8 {
        self.opcode
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (reg, imm, index) = parse_reg_imm_index(ctx.operands, ctx.skip);
        if (self.cond)(ctx.registers[reg], imm) {
            take_branch(ctx, index)
        } else {
            Control::Continue
        }
    }
}

/// Branch comparing two registers.
pub struct BranchRegOp {
    opcode: u8,
    name: &'static str,
    cond: fn(u64, u64) -> bool,
}

impl BranchRegOp {
    #[must_use]
    pub const fn new(opcode: u8, name: &'static str, cond: fn(u64, u64) -> bool) -> Self {
        Self { opcode, name, cond }
    }
}

impl InstructionHandler for BranchRegOp {
    fn opcode(&self) -> u8 {
        self.opcode
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn execute(&self, ctx: &mut ExecContext<'_>) -> Control {
        let (a, b, index) = parse_two_regs_index(ctx.operands, ctx.skip);
        if (self.cond)(ctx.registers[a], ctx.registers[b]) {
            take_branch(ctx, index)
        } else {
            Control::Continue
        }
    }
}

// Condition bodies.

pub fn eq_imm(a: u64, imm: i64) -> bool {
    a == imm as u64
}

pub fn ne_imm(a: u64, imm: i64) -> bool {
    a != imm as u64
}

pub fn lt_u_imm(a: u64, imm: i64) -> bool {
    a < imm as u64
}

pub fn le_u_imm(a: u64, imm: i64) -> bool {
    a <= imm as u64
}

pub fn ge_u_imm(a: u64, imm: i64) -> bool {
    a >= imm as u64
}

pub fn gt_u_imm(a: u64, imm: i64) -> bool {
    a > imm as u64
}

pub fn lt_s_imm(a: u64, imm: i64) -> bool {
    (a as i64) < imm
}

pub fn le_s_imm(a: u64, imm: i64) -> bool {
    (a as i64) <= imm
}

pub fn ge_s_imm(a: u64, imm: i64) -> bool {
    (a as i64) >= imm
}

pub fn gt_s_imm(a: u64, imm: i64) -> bool {
    (a as i64) > imm
}

pub fn eq(a: u64, b: u64) -> bool {
    a == b
}

pub fn ne(a: u64, b: u64) -> bool {
    a != b
}

pub fn lt_u(a: u64, b: u64) -> bool {
    a < b
}

pub fn lt_s(a: u64, b: u64) -> bool {
    (a as i64) < (b as i64)
}

pub fn ge_u(a: u64, b: u64) -> bool {
    a >= b
}

pub fn ge_s(a: u64, b: u64) -> bool {
    (a as i64) >= (b as i64)
}
