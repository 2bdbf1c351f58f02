//! Core scalar aliases and shared value types.

use crate::config::MEMO_SIZE;

pub type Balance = u64;
pub type Gas = i64;
pub type ServiceId = u32;
pub type Timeslot = u32;
pub type CoreId = u16;
pub type ValidatorId = u16;
pub type Hash = [u8; 32];

pub const ZERO_HASH: Hash = [0u8; 32];

/// Register state: 13 × 64-bit registers.
pub type Registers = [u64; crate::config::NUM_REGISTERS];

/// Execution status of a PVM instance.
///
/// `code()` gives the numeric form surfaced to embedders: 0 halt, 1 panic,
/// 2 out-of-gas, 3 fault, 4 host; a machine stopped mid-run (single-step
/// tracing) surfaces 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Continue,
    Halt,
    Panic,
    OutOfGas,
    Fault,
    Host,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Status::Halt => 0,
            Status::Panic => 1,
            Status::OutOfGas => 2,
            Status::Fault => 3,
            Status::Host => 4,
            Status::Continue => 5,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Halt | Status::Panic | Status::OutOfGas | Status::Fault
        )
    }
}

/// A transfer enqueued during accumulation, fired after the batch completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredTransfer {
    pub source: ServiceId,
    pub dest: ServiceId,
    pub amount: Balance,
    pub memo: [u8; MEMO_SIZE],
    pub gas: u64,
}

impl DeferredTransfer {
    /// Canonical wire form: source, dest, amount, memo, gas.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 4 + 8 + MEMO_SIZE + 8);
        out.extend_from_slice(&self.source.to_le_bytes());
        out.extend_from_slice(&self.dest.to_le_bytes());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.memo);
        out.extend_from_slice(&self.gas.to_le_bytes());
        out
    }
}
