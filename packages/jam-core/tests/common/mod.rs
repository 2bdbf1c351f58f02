//! Shared helpers: a tiny assembler for guest programs and account setup.
#![allow(dead_code)]

use jam_core::accounts::ServiceAccount;
use jam_core::codec::encode_natural;
use jam_core::crypto::blake2b256;
use jam_core::state::ChainState;
use jam_core::types::ServiceId;

/// Builds a program blob instruction by instruction, tracking code offsets
/// so jump-table entries can reference instructions by index.
#[derive(Default)]
pub struct ProgramBuilder {
    instructions: Vec<(u8, Vec<u8>)>,
    exports: Vec<usize>,
    ro_data: Vec<u8>,
    rw_data: Vec<u8>,
    stack_size: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            stack_size: 4096,
            ..Self::default()
        }
    }

    pub fn op(mut self, opcode: u8, operands: &[u8]) -> Self {
        self.instructions.push((opcode, operands.to_vec()));
        self
    }

    /// Register the next jump-table entry, pointing at an instruction index.
    pub fn export(mut self, instruction: usize) -> Self {
        self.exports.push(instruction);
        self
    }

    pub fn ro(mut self, data: &[u8]) -> Self {
        self.ro_data = data.to_vec();
        self
    }

    pub fn rw(mut self, data: &[u8]) -> Self {
        self.rw_data = data.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut offsets = Vec::with_capacity(self.instructions.len());
        let mut offset = 0u32;
        for (_, operands) in &self.instructions {
            offsets.push(offset);
            offset += 1 + operands.len() as u32;
        }

        let mut code = Vec::new();
        let mut mask_bits = Vec::new();
        for (opcode, operands) in &self.instructions {
            code.push(*opcode);
            mask_bits.push(1u8);
            code.extend_from_slice(operands);
            mask_bits.extend(std::iter::repeat(0u8).take(operands.len()));
        }

        let mut blob = b"PVM\0".to_vec();
        blob.extend(encode_natural(self.ro_data.len() as u64));
        blob.extend(encode_natural(self.rw_data.len() as u64));
        blob.extend(encode_natural(0)); // heap
        blob.extend(encode_natural(u64::from(self.stack_size)));
        blob.extend(encode_natural(self.exports.len() as u64));
        for &instruction in &self.exports {
            blob.extend(encode_natural(u64::from(offsets[instruction])));
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
        blob.extend(&self.ro_data);
        blob.extend(&self.rw_data);
        blob
    }
}

/// Little-endian immediate helper for LOAD_IMM operands.
pub fn imm(reg: usize, value: u32) -> Vec<u8> {
    let mut operands = vec![reg as u8];
    let mut value = value;
    loop {
        operands.push((value & 0xff) as u8);
        value >>= 8;
        if value == 0 {
            break;
        }
    }
    // A set sign bit in the last byte would sign-extend; pad one zero byte.
    if operands[operands.len() - 1] & 0x80 != 0 {
        operands.push(0);
    }
    operands
}

/// Install a funded service whose code preimage is `blob`.
pub fn install_service<'a>(
    state: &'a mut ChainState,
    id: ServiceId,
    balance: u64,
    blob: &[u8],
) -> &'a mut ServiceAccount {
    let code_hash = blake2b256(blob);
    let mut account = ServiceAccount::new(code_hash, 0, 0);
    account.balance = balance;
    account.preimages.insert(code_hash, blob.to_vec());
    state.accounts.insert(id, account);
    state.accounts.get_mut(&id).expect("just inserted")
}
