//! PVM instruction set: handler trait, per-class implementations, registry.

pub mod alu;
pub mod base;
pub mod branching;
pub mod control_flow;
pub mod memory;
pub mod registry;
pub mod system;

use std::sync::OnceLock;

use crate::config::*;
use crate::instructions::alu::{CmovInstruction, MoveRegInstruction, RegImmOp, ThreeRegOp};
use crate::instructions::branching::{BranchImmOp, BranchRegOp};
use crate::instructions::control_flow::{
    FallthroughInstruction, HaltInstruction, JumpIndInstruction, JumpInstruction, TrapInstruction,
};
use crate::instructions::memory::{LoadImm64Instruction, LoadImmInstruction, LoadOp, StoreOp};
use crate::instructions::registry::InstructionRegistry;
use crate::instructions::system::{EcalliInstruction, SbrkInstruction};

/// The shared registry with every implemented opcode.
pub fn registry() -> &'static InstructionRegistry {
    static REGISTRY: OnceLock<InstructionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

fn build_registry() -> InstructionRegistry {
    use crate::instructions::{alu, branching};

    let mut r = InstructionRegistry::new();

    r.register(Box::new(TrapInstruction));
    r.register(Box::new(FallthroughInstruction));
    r.register(Box::new(HaltInstruction));
    r.register(Box::new(EcalliInstruction));
    r.register(Box::new(JumpInstruction));
    r.register(Box::new(JumpIndInstruction));
    r.register(Box::new(SbrkInstruction));
    r.register(Box::new(MoveRegInstruction));
    r.register(Box::new(LoadImmInstruction));
    r.register(Box::new(LoadImm64Instruction));

    // Absolute loads and stores.
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_U8, "LOAD_U8", 1, false, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_I8, "LOAD_I8", 1, true, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_U16, "LOAD_U16", 2, false, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_I16, "LOAD_I16", 2, true, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_U32, "LOAD_U32", 4, false, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_I32, "LOAD_I32", 4, true, false)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_U64, "LOAD_U64", 8, false, false)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_U8, "STORE_U8", 1, false)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_U16, "STORE_U16", 2, false)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_U32, "STORE_U32", 4, false)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_U64, "STORE_U64", 8, false)));

    // Base + offset loads and stores.
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_U8, "LOAD_IND_U8", 1, false, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_I8, "LOAD_IND_I8", 1, true, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_U16, "LOAD_IND_U16", 2, false, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_I16, "LOAD_IND_I16", 2, true, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_U32, "LOAD_IND_U32", 4, false, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_I32, "LOAD_IND_I32", 4, true, true)));
    r.register(Box::new(LoadOp::new(OPCODE_LOAD_IND_U64, "LOAD_IND_U64", 8, false, true)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_IND_U8, "STORE_IND_U8", 1, true)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_IND_U16, "STORE_IND_U16", 2, true)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_IND_U32, "STORE_IND_U32", 4, true)));
    r.register(Box::new(StoreOp::new(OPCODE_STORE_IND_U64, "STORE_IND_U64", 8, true)));

    // Register-immediate ALU.
    r.register(Box::new(RegImmOp::new(OPCODE_ADD_IMM_32, "ADD_IMM_32", alu::add_imm_32)));
    r.register(Box::new(RegImmOp::new(OPCODE_AND_IMM, "AND_IMM", alu::and_imm)));
    r.register(Box::new(RegImmOp::new(OPCODE_XOR_IMM, "XOR_IMM", alu::xor_imm)));
    r.register(Box::new(RegImmOp::new(OPCODE_OR_IMM, "OR_IMM", alu::or_imm)));
    r.register(Box::new(RegImmOp::new(OPCODE_MUL_IMM_32, "MUL_IMM_32", alu::mul_imm_32)));
    r.register(Box::new(RegImmOp::new(OPCODE_SET_LT_U_IMM, "SET_LT_U_IMM", alu::set_lt_u_imm)));
    r.register(Box::new(RegImmOp::new(OPCODE_SET_LT_S_IMM, "SET_LT_S_IMM", alu::set_lt_s_imm)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHLO_L_IMM_32, "SHLO_L_IMM_32", alu::shlo_l_imm_32)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHLO_R_IMM_32, "SHLO_R_IMM_32", alu::shlo_r_imm_32)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHAR_R_IMM_32, "SHAR_R_IMM_32", alu::shar_r_imm_32)));
    r.register(Box::new(RegImmOp::new(OPCODE_ADD_IMM_64, "ADD_IMM_64", alu::add_imm_64)));
    r.register(Box::new(RegImmOp::new(OPCODE_MUL_IMM_64, "MUL_IMM_64", alu::mul_imm_64)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHLO_L_IMM_64, "SHLO_L_IMM_64", alu::shlo_l_imm_64)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHLO_R_IMM_64, "SHLO_R_IMM_64", alu::shlo_r_imm_64)));
    r.register(Box::new(RegImmOp::new(OPCODE_SHAR_R_IMM_64, "SHAR_R_IMM_64", alu::shar_r_imm_64)));

    // Three-register ALU.
    r.register(Box::new(ThreeRegOp::new(OPCODE_ADD_32, "ADD_32", alu::add_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SUB_32, "SUB_32", alu::sub_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_MUL_32, "MUL_32", alu::mul_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_DIV_U_32, "DIV_U_32", alu::div_u_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_DIV_S_32, "DIV_S_32", alu::div_s_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_REM_U_32, "REM_U_32", alu::rem_u_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_REM_S_32, "REM_S_32", alu::rem_s_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHLO_L_32, "SHLO_L_32", alu::shlo_l_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHLO_R_32, "SHLO_R_32", alu::shlo_r_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHAR_R_32, "SHAR_R_32", alu::shar_r_32)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_ADD_64, "ADD_64", alu::add_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SUB_64, "SUB_64", alu::sub_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_MUL_64, "MUL_64", alu::mul_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_DIV_U_64, "DIV_U_64", alu::div_u_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_DIV_S_64, "DIV_S_64", alu::div_s_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_REM_U_64, "REM_U_64", alu::rem_u_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_REM_S_64, "REM_S_64", alu::rem_s_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHLO_L_64, "SHLO_L_64", alu::shlo_l_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHLO_R_64, "SHLO_R_64", alu::shlo_r_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SHAR_R_64, "SHAR_R_64", alu::shar_r_64)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_AND, "AND", alu::and)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_XOR, "XOR", alu::xor)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_OR, "OR", alu::or)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SET_LT_U, "SET_LT_U", alu::set_lt_u)));
    r.register(Box::new(ThreeRegOp::new(OPCODE_SET_LT_S, "SET_LT_S", alu::set_lt_s)));
    r.register(Box::new(CmovInstruction::new(OPCODE_CMOV_IZ, "CMOV_IZ", true)));
    r.register(Box::new(CmovInstruction::new(OPCODE_CMOV_NZ, "CMOV_NZ", false)));

    // Branches: register vs immediate.
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_EQ_IMM, "BRANCH_EQ_IMM", branching::eq_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_NE_IMM, "BRANCH_NE_IMM", branching::ne_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_LT_U_IMM, "BRANCH_LT_U_IMM", branching::lt_u_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_LE_U_IMM, "BRANCH_LE_U_IMM", branching::le_u_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_GE_U_IMM, "BRANCH_GE_U_IMM", branching::ge_u_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_GT_U_IMM, "BRANCH_GT_U_IMM", branching::gt_u_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_LT_S_IMM, "BRANCH_LT_S_IMM", branching::lt_s_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_LE_S_IMM, "BRANCH_LE_S_IMM", branching::le_s_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_GE_S_IMM, "BRANCH_GE_S_IMM", branching::ge_s_imm)));
    r.register(Box::new(BranchImmOp::new(OPCODE_BRANCH_GT_S_IMM, "BRANCH_GT_S_IMM", branching::gt_s_imm)));

    // Branches: register vs register.
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_EQ, "BRANCH_EQ", branching::eq)));
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_NE, "BRANCH_NE", branching::ne)));
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_LT_U, "BRANCH_LT_U", branching::lt_u)));
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_LT_S, "BRANCH_LT_S", branching::lt_s)));
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_GE_U, "BRANCH_GE_U", branching::ge_u)));
    r.register(Box::new(BranchRegOp::new(OPCODE_BRANCH_GE_S, "BRANCH_GE_S", branching::ge_s)));

    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_no_duplicate_opcodes() {
        let r = registry();
        assert!(r.contains(OPCODE_HALT));
        assert!(r.contains(OPCODE_ECALLI));
        assert!(r.contains(OPCODE_BRANCH_GE_S));
        assert!(!r.contains(3));
        assert!(r.opcodes().len() >= 80);
    }
}
