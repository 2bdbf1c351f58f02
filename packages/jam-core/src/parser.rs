//! PVM program blob parser.
//!
//! Wire format, bit-exact:
//!
//! ```text
//! magic "PVM\0" | ro_data_len | rw_data_len | heap_size | stack_size
//! | jump_table_count, entries… | code_len
//! | opcode_mask (⌈code_len/8⌉ bytes, MSB-first) | code | ro_data | rw_data
//! ```
//!
//! All scalars are compact naturals. The opcode mask marks instruction-head
//! bytes; skip distances are precomputed in a single pass from the end of the
//! code so per-step decoding stays O(1).

use thiserror::Error;

use crate::codec::{CodecError, Reader};
use crate::config::{MAX_SERVICE_CODE_SIZE, MAX_SKIP};

pub const PROGRAM_MAGIC: &[u8; 4] = b"PVM\0";

/// Byte cap on each data section and on heap/stack declarations.
const DATA_LIMIT: u64 = 1 << 24;
/// Entry cap on the jump table.
const JUMP_TABLE_LIMIT: u64 = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("bad program magic")]
    BadMagic,
    #[error("opcode mask does not match code length")]
    MaskMismatch,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A parsed, immutable PVM program.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub code: Vec<u8>,
    /// Unpacked opcode mask, one byte per code byte, 1 = instruction head.
    pub(crate) mask: Vec<u8>,
    /// Precomputed skip distance per code offset, capped at [`MAX_SKIP`].
    pub(crate) skip: Vec<u8>,
    pub jump_table: Vec<u32>,
    pub ro_data: Vec<u8>,
    pub rw_data: Vec<u8>,
    pub heap_size: u32,
    pub stack_size: u32,
}

impl Program {
    pub fn parse(blob: &[u8]) -> Result<Self, ProgramError> {
        let mut r = Reader::new(blob);
        if r.bytes(4)? != PROGRAM_MAGIC.as_slice() {
            return Err(ProgramError::BadMagic);
        }
        let ro_len = r.bounded_natural(DATA_LIMIT)? as usize;
        let rw_len = r.bounded_natural(DATA_LIMIT)? as usize;
        let heap_size = r.bounded_natural(DATA_LIMIT)? as u32;
        let stack_size = r.bounded_natural(DATA_LIMIT)? as u32;
        let jump_table_count = r.bounded_natural(JUMP_TABLE_LIMIT)? as usize;
        let mut jump_table = Vec::with_capacity(jump_table_count);
        for _ in 0..jump_table_count {
            jump_table.push(r.bounded_natural(u64::from(u32::MAX))? as u32);
        }
        let code_len = r.bounded_natural(MAX_SERVICE_CODE_SIZE)? as usize;
        let mask_packed = r.bytes(code_len.div_ceil(8))?.to_vec();
        let code = r.bytes(code_len)?.to_vec();
        let ro_data = r.bytes(ro_len)?.to_vec();
        let rw_data = r.bytes(rw_len)?.to_vec();
        r.finish()?;

        // MSB-first within each byte: bit for code offset i lives at
        // mask_packed[i / 8], bit position 7 - (i % 8).
        let mut mask = vec![0u8; code_len];
        for (i, bit) in mask.iter_mut().enumerate() {
            *bit = (mask_packed[i / 8] >> (7 - (i % 8))) & 1;
        }
        if code_len % 8 != 0 {
            let padding = mask_packed[code_len / 8] & ((1 << (8 - code_len % 8)) - 1);
            if padding != 0 {
                return Err(ProgramError::MaskMismatch);
            }
        }

        let mut skip = vec![0u8; code_len];
        let mut zero_run = 0u32;
        for i in (0..code_len).rev() {
            skip[i] = zero_run.min(MAX_SKIP) as u8;
            zero_run = if mask[i] == 1 { 0 } else { zero_run + 1 };
        }

        Ok(Self {
            code,
            mask,
            skip,
            jump_table,
            ro_data,
            rw_data,
            heap_size,
            stack_size,
        })
    }

    /// True when `pc` is inside the code and begins an instruction.
    #[must_use]
    pub fn is_instruction(&self, pc: u32) -> bool {
        self.mask.get(pc as usize).copied() == Some(1)
    }

    /// Operand byte count following the opcode at `pc`.
    #[must_use]
    pub fn skip_at(&self, pc: u32) -> u32 {
        u32::from(self.skip.get(pc as usize).copied().unwrap_or(0))
    }

    /// Resolve a jump-table index to a validated instruction address.
    #[must_use]
    pub fn jump_target(&self, index: u64) -> Option<u32> {
        let target = *self.jump_table.get(usize::try_from(index).ok()?)?;
        self.is_instruction(target).then_some(target)
    }
}
