//! Protocol and PVM configuration constants (Gray Paper).

use crate::types::ServiceId;

// ============================================================================
// Gas
// ============================================================================

/// Gas charged per host call before the handler runs.
pub const HOST_CALL_BASE_GAS: i64 = 10;

/// Per-opcode gas cost. Uniform for now; the table hook keeps call sites stable.
#[must_use]
pub const fn gas_cost(_opcode: u8) -> i64 {
    1
}

// ============================================================================
// Memory map
// ============================================================================

pub const PAGE_SIZE: u32 = 4096;
/// Max-page (zone) granularity separating memory regions.
pub const ZONE_SIZE: u32 = 65_536;
/// Base of the read-only data region (one zone above the null zone).
pub const RO_DATA_BASE: u32 = 0x0001_0000;
/// Jumping here halts; seeds RA at invocation start. 2^32 - 2^16.
pub const RETURN_SENTINEL: u32 = 0xFFFF_0000;
/// Exclusive top of the stack region; seeds SP. One zone below the args base.
pub const STACK_TOP: u32 = 0xFEFE_0000;
/// Base of the read-only argument region.
pub const ARGS_BASE: u32 = 0xFEFF_0000;
/// Capacity of the argument region (16 MiB, up to the return sentinel).
pub const ARGS_CAPACITY: u32 = 0x0100_0000;

/// Align size up to a page boundary.
#[must_use]
pub const fn align_to_page(size: u32) -> u32 {
    size.div_ceil(PAGE_SIZE) * PAGE_SIZE
}

/// Align size up to a zone boundary.
#[must_use]
pub const fn align_to_zone(size: u32) -> u32 {
    size.div_ceil(ZONE_SIZE) * ZONE_SIZE
}

// ============================================================================
// Register file (13 × 64-bit)
// ============================================================================

pub const NUM_REGISTERS: usize = 13;
pub const REG_RA: usize = 0;
pub const REG_SP: usize = 1;
pub const REG_T0: usize = 2;
pub const REG_T1: usize = 3;
pub const REG_T2: usize = 4;
pub const REG_S0: usize = 5;
pub const REG_S1: usize = 6;
pub const REG_A0: usize = 7;
pub const REG_A1: usize = 8;
pub const REG_A2: usize = 9;
pub const REG_A3: usize = 10;
pub const REG_A4: usize = 11;
pub const REG_A5: usize = 12;

// ============================================================================
// Opcodes (Gray Paper Appendix A numbering)
// ============================================================================

pub const OPCODE_TRAP: u8 = 0;
pub const OPCODE_FALLTHROUGH: u8 = 1;
pub const OPCODE_HALT: u8 = 2;
pub const OPCODE_ECALLI: u8 = 10;
pub const OPCODE_LOAD_IMM_64: u8 = 20;
pub const OPCODE_JUMP: u8 = 40;
pub const OPCODE_JUMP_IND: u8 = 50;
pub const OPCODE_LOAD_IMM: u8 = 51;
pub const OPCODE_LOAD_U8: u8 = 52;
pub const OPCODE_LOAD_I8: u8 = 53;
pub const OPCODE_LOAD_U16: u8 = 54;
pub const OPCODE_LOAD_I16: u8 = 55;
pub const OPCODE_LOAD_U32: u8 = 56;
pub const OPCODE_LOAD_I32: u8 = 57;
pub const OPCODE_LOAD_U64: u8 = 58;
pub const OPCODE_STORE_U8: u8 = 59;
pub const OPCODE_STORE_U16: u8 = 60;
pub const OPCODE_STORE_U32: u8 = 61;
pub const OPCODE_STORE_U64: u8 = 62;
pub const OPCODE_BRANCH_EQ_IMM: u8 = 81;
pub const OPCODE_BRANCH_NE_IMM: u8 = 82;
pub const OPCODE_BRANCH_LT_U_IMM: u8 = 83;
pub const OPCODE_BRANCH_LE_U_IMM: u8 = 84;
pub const OPCODE_BRANCH_GE_U_IMM: u8 = 85;
pub const OPCODE_BRANCH_GT_U_IMM: u8 = 86;
pub const OPCODE_BRANCH_LT_S_IMM: u8 = 87;
pub const OPCODE_BRANCH_LE_S_IMM: u8 = 88;
pub const OPCODE_BRANCH_GE_S_IMM: u8 = 89;
pub const OPCODE_BRANCH_GT_S_IMM: u8 = 90;
pub const OPCODE_MOVE_REG: u8 = 100;
pub const OPCODE_SBRK: u8 = 101;
pub const OPCODE_STORE_IND_U8: u8 = 120;
pub const OPCODE_STORE_IND_U16: u8 = 121;
pub const OPCODE_STORE_IND_U32: u8 = 122;
pub const OPCODE_STORE_IND_U64: u8 = 123;
pub const OPCODE_LOAD_IND_U8: u8 = 124;
pub const OPCODE_LOAD_IND_I8: u8 = 125;
pub const OPCODE_LOAD_IND_U16: u8 = 126;
pub const OPCODE_LOAD_IND_I16: u8 = 127;
pub const OPCODE_LOAD_IND_U32: u8 = 128;
pub const OPCODE_LOAD_IND_I32: u8 = 129;
pub const OPCODE_LOAD_IND_U64: u8 = 130;
pub const OPCODE_ADD_IMM_32: u8 = 131;
pub const OPCODE_AND_IMM: u8 = 132;
pub const OPCODE_XOR_IMM: u8 = 133;
pub const OPCODE_OR_IMM: u8 = 134;
pub const OPCODE_MUL_IMM_32: u8 = 135;
pub const OPCODE_SET_LT_U_IMM: u8 = 136;
pub const OPCODE_SET_LT_S_IMM: u8 = 137;
pub const OPCODE_SHLO_L_IMM_32: u8 = 138;
pub const OPCODE_SHLO_R_IMM_32: u8 = 139;
pub const OPCODE_SHAR_R_IMM_32: u8 = 140;
pub const OPCODE_ADD_IMM_64: u8 = 149;
pub const OPCODE_MUL_IMM_64: u8 = 150;
pub const OPCODE_SHLO_L_IMM_64: u8 = 151;
pub const OPCODE_SHLO_R_IMM_64: u8 = 152;
pub const OPCODE_SHAR_R_IMM_64: u8 = 153;
pub const OPCODE_BRANCH_EQ: u8 = 170;
pub const OPCODE_BRANCH_NE: u8 = 171;
pub const OPCODE_BRANCH_LT_U: u8 = 172;
pub const OPCODE_BRANCH_LT_S: u8 = 173;
pub const OPCODE_BRANCH_GE_U: u8 = 174;
pub const OPCODE_BRANCH_GE_S: u8 = 175;
pub const OPCODE_ADD_32: u8 = 190;
pub const OPCODE_SUB_32: u8 = 191;
pub const OPCODE_MUL_32: u8 = 192;
pub const OPCODE_DIV_U_32: u8 = 193;
pub const OPCODE_DIV_S_32: u8 = 194;
pub const OPCODE_REM_U_32: u8 = 195;
pub const OPCODE_REM_S_32: u8 = 196;
pub const OPCODE_SHLO_L_32: u8 = 197;
pub const OPCODE_SHLO_R_32: u8 = 198;
pub const OPCODE_SHAR_R_32: u8 = 199;
pub const OPCODE_ADD_64: u8 = 200;
pub const OPCODE_SUB_64: u8 = 201;
pub const OPCODE_MUL_64: u8 = 202;
pub const OPCODE_DIV_U_64: u8 = 203;
pub const OPCODE_DIV_S_64: u8 = 204;
pub const OPCODE_REM_U_64: u8 = 205;
pub const OPCODE_REM_S_64: u8 = 206;
pub const OPCODE_SHLO_L_64: u8 = 207;
pub const OPCODE_SHLO_R_64: u8 = 208;
pub const OPCODE_SHAR_R_64: u8 = 209;
pub const OPCODE_AND: u8 = 210;
pub const OPCODE_XOR: u8 = 211;
pub const OPCODE_OR: u8 = 212;
pub const OPCODE_SET_LT_U: u8 = 216;
pub const OPCODE_SET_LT_S: u8 = 217;
pub const OPCODE_CMOV_IZ: u8 = 218;
pub const OPCODE_CMOV_NZ: u8 = 219;

/// Skip distances are capped by the maximum instruction length.
pub const MAX_SKIP: u32 = 24;

// ============================================================================
// Invocation entry points (jump-table export indices)
// ============================================================================

pub const EXPORT_ACCUMULATE: usize = 0;
pub const EXPORT_ON_TRANSFER: usize = 1;

// ============================================================================
// Host call identifiers (Gray Paper Appendix B)
// ============================================================================

pub const HOST_GAS: u8 = 0;
pub const HOST_FETCH: u8 = 1;
pub const HOST_LOOKUP: u8 = 2;
pub const HOST_READ: u8 = 3;
pub const HOST_WRITE: u8 = 4;
pub const HOST_INFO: u8 = 5;
pub const HOST_EXPORT: u8 = 7;
pub const HOST_MACHINE: u8 = 8;
pub const HOST_INVOKE: u8 = 12;
pub const HOST_EXPUNGE: u8 = 13;
pub const HOST_BLESS: u8 = 14;
pub const HOST_ASSIGN: u8 = 15;
pub const HOST_DESIGNATE: u8 = 16;
pub const HOST_CHECKPOINT: u8 = 17;
pub const HOST_NEW: u8 = 18;
pub const HOST_UPGRADE: u8 = 19;
pub const HOST_TRANSFER: u8 = 20;
pub const HOST_EJECT: u8 = 21;
pub const HOST_SOLICIT: u8 = 23;
pub const HOST_FORGET: u8 = 24;
pub const HOST_YIELD: u8 = 25;
pub const HOST_PROVIDE: u8 = 26;
pub const HOST_AUTO_ACCUMULATE: u8 = 27;
pub const HOST_LOG: u8 = 100;

// ============================================================================
// Host call sentinel result codes (two's-complement u64 in A0)
// ============================================================================

pub const REG_NONE: u64 = u64::MAX;
pub const REG_WHAT: u64 = u64::MAX - 1;
pub const REG_OOB: u64 = u64::MAX - 2;
pub const REG_WHO: u64 = u64::MAX - 3;
pub const REG_FULL: u64 = u64::MAX - 4;
pub const REG_CORE: u64 = u64::MAX - 5;
pub const REG_CASH: u64 = u64::MAX - 6;
pub const REG_LOW: u64 = u64::MAX - 7;
pub const REG_HIGH: u64 = u64::MAX - 8;
pub const REG_HUH: u64 = u64::MAX - 9;
pub const REG_OK: u64 = 0;

// ============================================================================
// Deposits (min-balance formula)
// ============================================================================

pub const BASE_DEPOSIT: u64 = 100;
pub const ITEM_DEPOSIT: u64 = 10;
pub const BYTE_DEPOSIT: u64 = 1;

/// Octets charged per preimage request entry, on top of the preimage length.
pub const REQUEST_ENTRY_OVERHEAD: u64 = 81;
/// Octets charged per storage entry, on top of key and value lengths.
pub const STORAGE_ENTRY_OVERHEAD: u64 = 34;

// ============================================================================
// Protocol constants
// ============================================================================

/// Preimage expiry (D): slots before a provided preimage may be forgotten.
pub const PREIMAGE_EXPIRY: u32 = 19_200;
pub const MEMO_SIZE: usize = 128;
/// Service ids below this are reserved for the registrar.
pub const MIN_PUBLIC_SERVICE_ID: ServiceId = 1 << 16;
pub const MAX_SERVICE_CODE_SIZE: u64 = 4_000_000;
pub const CORE_COUNT: u16 = 341;
pub const VALIDATOR_COUNT: u16 = 1023;
pub const AUTH_QUEUE_SIZE: usize = 80;
pub const VALIDATOR_KEY_SIZE: usize = 336;
pub const MAX_PACKAGE_ITEMS: usize = 16;
pub const MAX_REPORT_DEPS: usize = 8;

/// Erasure parameters, re-stated from the erasure crate.
pub const SEGMENT_SIZE: usize = jam_reed_solomon::SEGMENT_SIZE;
pub const EC_DATA_SEGMENTS: usize = jam_reed_solomon::DATA_SEGMENTS;
pub const EC_TOTAL_SEGMENTS: usize = jam_reed_solomon::TOTAL_SEGMENTS;

// ============================================================================
// Runtime configuration
// ============================================================================

/// Chain-level parameters threaded through accumulation and the FETCH host
/// call (selector 0). Defaults are the protocol values.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub core_count: u16,
    pub validator_count: u16,
    pub auth_queue_size: usize,
    pub preimage_expiry: u32,
    pub epoch_duration: u32,
    pub slot_duration: u32,
    pub max_block_gas: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            core_count: CORE_COUNT,
            validator_count: VALIDATOR_COUNT,
            auth_queue_size: AUTH_QUEUE_SIZE,
            preimage_expiry: PREIMAGE_EXPIRY,
            epoch_duration: 600,
            slot_duration: 6,
            max_block_gas: 3_500_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_helpers() {
        assert_eq!(align_to_page(0), 0);
        assert_eq!(align_to_page(1), PAGE_SIZE);
        assert_eq!(align_to_page(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(align_to_zone(PAGE_SIZE), ZONE_SIZE);
        assert_eq!(align_to_zone(ZONE_SIZE + 1), 2 * ZONE_SIZE);
    }

    #[test]
    fn memory_map_regions_do_not_overlap() {
        assert!(RO_DATA_BASE >= ZONE_SIZE);
        assert_eq!(ARGS_BASE - STACK_TOP, ZONE_SIZE);
        assert_eq!(RETURN_SENTINEL - ARGS_BASE, ARGS_CAPACITY);
    }
}
