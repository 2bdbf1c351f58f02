//! PVM execution state machine.
//!
//! One [`Pvm`] lives for exactly one invocation. Each step reads the opcode
//! at the program counter, charges gas, decodes operands by the precomputed
//! skip distance, and dispatches through the instruction registry. `ecalli`
//! suspends with [`Status::Host`] and leaves the program counter on the
//! ecalli; [`Pvm::resume_after_host`] advances past it once the embedder has
//! handled the call.

use crate::config::{
    gas_cost, ARGS_BASE, ARGS_CAPACITY, NUM_REGISTERS, REG_A0, REG_A1, REG_RA, REG_SP,
    RETURN_SENTINEL, STACK_TOP,
};
use crate::instructions::base::{Control, ExecContext};
use crate::instructions::registry;
use crate::parser::Program;
use crate::ram::Memory;
use crate::types::{Registers, Status};

pub struct Pvm {
    program: Program,
    pub registers: Registers,
    pub pc: u32,
    /// Remaining gas. Signed: intermediate computation may drive it negative,
    /// at which point the machine is out of gas.
    pub gas: i64,
    status: Status,
    pub memory: Memory,
    host_call_id: u64,
    fault_address: u32,
}

impl Pvm {
    #[must_use]
    pub fn new(program: Program, gas: i64) -> Self {
        let memory = Memory::for_program(&program);
        let mut registers = [0u64; NUM_REGISTERS];
        registers[REG_RA] = u64::from(RETURN_SENTINEL);
        registers[REG_SP] = u64::from(STACK_TOP);
        Self {
            program,
            registers,
            pc: 0,
            gas,
            status: Status::Continue,
            memory,
            host_call_id: 0,
            fault_address: 0,
        }
    }

    /// Map the invocation arguments and seed A0/A1 with their address and
    /// length. Arguments beyond the region capacity are truncated.
    pub fn set_args(&mut self, args: &[u8]) {
        let args = &args[..args.len().min(ARGS_CAPACITY as usize)];
        self.memory.map_args(args);
        self.registers[REG_A0] = u64::from(ARGS_BASE);
        self.registers[REG_A1] = args.len() as u64;
    }

    /// Begin execution at an exported entry point (a jump-table index). An
    /// export that does not resolve to an instruction head faults at once.
    pub fn start_at_export(&mut self, export: usize) {
        match self.program.jump_target(export as u64) {
            Some(pc) => self.pc = pc,
            None => {
                self.status = Status::Fault;
                self.fault_address = 0;
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Id recorded by the last `ecalli`.
    #[must_use]
    pub fn host_call_id(&self) -> u64 {
        self.host_call_id
    }

    #[must_use]
    pub fn fault_address(&self) -> u32 {
        self.fault_address
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Execute one instruction. Returns the status after the step.
    pub fn step(&mut self) -> Status {
        if self.status != Status::Continue {
            return self.status;
        }
        let pc = self.pc;
        let code_len = self.program.code.len();
        if pc as usize >= code_len {
            self.status = Status::Fault;
            self.fault_address = pc;
            return self.status;
        }
        let opcode = self.program.code[pc as usize];
        self.gas -= gas_cost(opcode);
        if self.gas < 0 {
            self.status = Status::OutOfGas;
            return self.status;
        }
        let skip = self.program.skip_at(pc);
        let Some(handler) = registry().get(opcode) else {
            self.status = Status::Fault;
            self.fault_address = pc;
            return self.status;
        };

        let Pvm {
            program,
            registers,
            memory,
            host_call_id,
            ..
        } = self;
        let program = &*program;
        let operand_end = ((pc + 1 + skip) as usize).min(code_len);
        let operands = &program.code[((pc + 1) as usize).min(code_len)..operand_end];
        let mut ctx = ExecContext {
            program,
            registers,
            memory,
            pc,
            operands,
            skip,
            host_call_id,
        };
        match handler.execute(&mut ctx) {
            Control::Continue => self.pc = pc + 1 + skip,
            Control::Jump(target) => self.pc = target,
            Control::Halt => self.status = Status::Halt,
            Control::Panic => self.status = Status::Panic,
            Control::Fault(address) => {
                self.status = Status::Fault;
                self.fault_address = address;
            }
            Control::Host => self.status = Status::Host,
        }
        self.status
    }

    /// Run until the machine halts, faults, runs dry, or suspends for a host
    /// call.
    pub fn run(&mut self) -> Status {
        loop {
            match self.step() {
                Status::Continue => {}
                status => return status,
            }
        }
    }

    /// Re-enter after the host handled the pending call: skip past the
    /// ecalli encoding and continue.
    pub fn resume_after_host(&mut self) {
        debug_assert_eq!(self.status, Status::Host);
        self.pc += 1 + self.program.skip_at(self.pc);
        self.status = Status::Continue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_natural;
    use crate::config::*;

    /// Minimal assembler: instructions as (opcode, operand bytes), plus a
    /// jump table of code offsets.
    fn assemble(instructions: &[(u8, &[u8])], jump_table: &[u32]) -> Program {
        let mut code = Vec::new();
        let mut mask_bits = Vec::new();
        for &(opcode, operands) in instructions {
            code.push(opcode);
            mask_bits.push(1u8);
            code.extend_from_slice(operands);
            mask_bits.extend(std::iter::repeat(0u8).take(operands.len()));
        }
        let mut blob = b"PVM\0".to_vec();
        blob.extend(encode_natural(0)); // ro
        blob.extend(encode_natural(0)); // rw
        blob.extend(encode_natural(0)); // heap
        blob.extend(encode_natural(4096)); // stack
        blob.extend(encode_natural(jump_table.len() as u64));
        for &entry in jump_table {
            blob.extend(encode_natural(u64::from(entry)));
        }
        blob.extend(encode_natural(code.len() as u64));
        let mut packed = vec![0u8; code.len().div_ceil(8)];
        for (i, &bit) in mask_bits.iter().enumerate() {
            if bit != 0 {
                packed[i / 8] |= 1 << (7 - (i % 8));
            }
        }
        blob.extend(packed);
        blob.extend(code);
        Program::parse(&blob).unwrap()
    }

    #[test]
    fn load_immediate_then_halt() {
        let program = assemble(
            &[(OPCODE_LOAD_IMM, &[REG_A0 as u8, 65]), (OPCODE_HALT, &[])],
            &[],
        );
        let mut vm = Pvm::new(program, 100);
        assert_eq!(vm.run(), Status::Halt);
        assert_eq!(vm.registers[REG_A0], 65);
        assert_eq!(vm.gas, 100 - gas_cost(OPCODE_LOAD_IMM) - gas_cost(OPCODE_HALT));
        assert_eq!(vm.status().code(), 0);
    }

    #[test]
    fn gas_exhaustion_is_out_of_gas() {
        let program = assemble(
            &[(OPCODE_LOAD_IMM, &[REG_A0 as u8, 1]), (OPCODE_HALT, &[])],
            &[],
        );
        let mut vm = Pvm::new(program, 1);
        assert_eq!(vm.run(), Status::OutOfGas);
        assert_eq!(vm.status().code(), 2);
    }

    #[test]
    fn trap_panics_and_running_off_code_faults() {
        let mut vm = Pvm::new(assemble(&[(OPCODE_TRAP, &[])], &[]), 10);
        assert_eq!(vm.run(), Status::Panic);

        let mut vm = Pvm::new(assemble(&[(OPCODE_FALLTHROUGH, &[])], &[]), 10);
        assert_eq!(vm.run(), Status::Fault);
        assert_eq!(vm.fault_address(), 1);
    }

    #[test]
    fn unknown_opcode_faults() {
        let mut vm = Pvm::new(assemble(&[(3, &[])], &[]), 10);
        assert_eq!(vm.run(), Status::Fault);
    }

    #[test]
    fn branch_resolves_through_jump_table() {
        // if A0 == 7, branch to the halt at offset 8, else fall into the trap.
        let program = assemble(
            &[
                (OPCODE_LOAD_IMM, &[REG_A0 as u8, 7]),  // offsets 0..=2
                (OPCODE_BRANCH_EQ_IMM, &[0x17, 7, 0]),  // offsets 3..=6, immX len 1
                (OPCODE_TRAP, &[]),                     // offset 7
                (OPCODE_HALT, &[]),                     // offset 8
            ],
            &[8],
        );
        let mut vm = Pvm::new(program, 100);
        assert_eq!(vm.run(), Status::Halt);
    }

    #[test]
    fn branch_to_operand_byte_faults() {
        // Jump table points into the middle of the load instruction.
        let program = assemble(
            &[
                (OPCODE_LOAD_IMM, &[REG_A0 as u8, 7]),
                (OPCODE_JUMP, &[0]),
                (OPCODE_HALT, &[]),
            ],
            &[1],
        );
        let mut vm = Pvm::new(program, 100);
        assert_eq!(vm.run(), Status::Fault);
    }

    #[test]
    fn jump_ind_to_return_sentinel_halts() {
        // RA still holds the sentinel; JUMP_IND through it exits normally.
        let program = assemble(&[(OPCODE_JUMP_IND, &[REG_RA as u8])], &[]);
        let mut vm = Pvm::new(program, 10);
        assert_eq!(vm.run(), Status::Halt);
    }

    #[test]
    fn ecalli_suspends_and_resumes_past_the_encoding() {
        let program = assemble(
            &[
                (OPCODE_ECALLI, &[9]),
                (OPCODE_LOAD_IMM, &[REG_A1 as u8, 3]),
                (OPCODE_HALT, &[]),
            ],
            &[],
        );
        let mut vm = Pvm::new(program, 100);
        assert_eq!(vm.run(), Status::Host);
        assert_eq!(vm.host_call_id(), 9);
        assert_eq!(vm.pc, 0, "pc must not advance before the host handles the call");
        vm.resume_after_host();
        assert_eq!(vm.run(), Status::Halt);
        assert_eq!(vm.registers[REG_A1], 3);
    }

    #[test]
    fn export_entry_points_resolve_through_jump_table() {
        let program = assemble(
            &[(OPCODE_TRAP, &[]), (OPCODE_HALT, &[])],
            &[1, 0],
        );
        let mut vm = Pvm::new(program.clone(), 10);
        vm.start_at_export(0);
        assert_eq!(vm.run(), Status::Halt);

        let mut vm = Pvm::new(program, 10);
        vm.start_at_export(2); // no such export
        assert_eq!(vm.run(), Status::Fault);
    }

    #[test]
    fn args_are_mapped_read_only_with_registers_seeded() {
        let program = assemble(
            &[
                (OPCODE_LOAD_IND_U8, &[(REG_A0 as u8) << 4 | REG_T0 as u8]),
                (OPCODE_HALT, &[]),
            ],
            &[],
        );
        let mut vm = Pvm::new(program, 100);
        vm.set_args(b"hi");
        assert_eq!(vm.registers[REG_A0], u64::from(ARGS_BASE));
        assert_eq!(vm.registers[REG_A1], 2);
        assert_eq!(vm.run(), Status::Halt);
        assert_eq!(vm.registers[REG_T0], u64::from(b'h'));
    }
}
