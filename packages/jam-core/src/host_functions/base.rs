//! Host-call trait, context, and shared helpers.
//!
//! Handler contract: read arguments from A0–A5, effect the implications
//! context, write a result word to A0, and return [`HostOutcome::Continue`].
//! Failures surface as sentinel codes in A0; only hardware-like faults
//! (unreadable or unwritable guest memory) change the machine status.

use std::collections::BTreeMap;

use crate::accounts::ServiceAccount;
use crate::accumulate::context::ImplicationsPair;
use crate::config::{ChainConfig, REG_A0, REG_NONE};
use crate::pvm::Pvm;
use crate::ram::Memory;
use crate::state::PrivilegedState;
use crate::types::{Hash, Registers, ServiceId, Timeslot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostOutcome {
    Continue,
    Fault(u32),
    OutOfGas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationPhase {
    Accumulate,
    OnTransfer,
}

/// Nested guest machines created via the `machine` host call.
#[derive(Default)]
pub struct GuestMachines {
    machines: BTreeMap<u64, Pvm>,
    next_id: u64,
}

impl GuestMachines {
    pub fn add(&mut self, vm: Pvm) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.machines.insert(id, vm);
        id
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Pvm> {
        self.machines.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Pvm> {
        self.machines.remove(&id)
    }
}

pub struct HostCallContext<'a> {
    pub registers: &'a mut Registers,
    pub memory: &'a mut Memory,
    pub gas: &'a mut i64,
    /// Service under accumulation.
    pub service_id: ServiceId,
    pub timeslot: Timeslot,
    pub phase: InvocationPhase,
    pub pair: &'a mut ImplicationsPair,
    /// Privileged roles as of the start of the timeslot. Role checks go
    /// through this view; updates land in the pair and take effect at the
    /// boundary.
    pub slot_roles: &'a PrivilegedState,
    pub config: &'a ChainConfig,
    /// Current entropy accumulator, served by `fetch`.
    pub entropy: Hash,
    /// Encoded work package under accumulation, when known.
    pub work_package: Option<&'a [u8]>,
    /// Recent block hashes, newest last.
    pub recent_blocks: &'a [Hash],
    pub guests: &'a mut GuestMachines,
    /// Segment sink for `export`; absent outside refinement.
    pub exports: Option<&'a mut Vec<Vec<u8>>>,
}

impl HostCallContext<'_> {
    /// Argument register `A<index>`.
    #[must_use]
    pub fn arg(&self, index: usize) -> u64 {
        self.registers[REG_A0 + index]
    }

    /// Write the result word to A0.
    pub fn set_result(&mut self, value: u64) {
        self.registers[REG_A0] = value;
    }

    /// Map a register value onto a service id; [`REG_NONE`] names the
    /// invoking service. Values beyond the id range resolve to nothing.
    #[must_use]
    pub fn resolve_service(&self, raw: u64) -> Option<ServiceId> {
        if raw == REG_NONE {
            Some(self.service_id)
        } else {
            u32::try_from(raw).ok()
        }
    }

    #[must_use]
    pub fn account(&self, id: ServiceId) -> Option<&ServiceAccount> {
        self.pair.regular.state.accounts.get(&id)
    }

    pub fn account_mut(&mut self, id: ServiceId) -> Option<&mut ServiceAccount> {
        self.pair.regular.state.accounts.get_mut(&id)
    }

    #[must_use]
    pub fn current_account(&self) -> Option<&ServiceAccount> {
        self.account(self.service_id)
    }

    pub fn current_account_mut(&mut self) -> Option<&mut ServiceAccount> {
        self.account_mut(self.service_id)
    }

    /// Read guest memory, faulting like a hardware access would.
    pub fn read_memory(&self, address: u64, len: u64) -> Result<Vec<u8>, HostOutcome> {
        let (address, len) = clamp_range(address, len)?;
        self.memory
            .read(address, len)
            .map_err(HostOutcome::Fault)
    }

    pub fn read_hash(&self, address: u64) -> Result<Hash, HostOutcome> {
        let bytes = self.read_memory(address, 32)?;
        Ok(bytes.try_into().expect("32 bytes"))
    }

    pub fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), HostOutcome> {
        let (address, _) = clamp_range(address, data.len() as u64)?;
        self.memory.write(address, data).map_err(HostOutcome::Fault)
    }
}

/// Addresses follow the VM's 32-bit memory semantics (low 32 bits of the
/// register); a length that cannot fit the address space faults outright.
fn clamp_range(address: u64, len: u64) -> Result<(u32, u32), HostOutcome> {
    match u32::try_from(len) {
        Ok(len) => Ok((address as u32, len)),
        Err(_) => Err(HostOutcome::Fault(address as u32)),
    }
}

pub trait HostCall: Send + Sync {
    fn id(&self) -> u8;
    fn name(&self) -> &'static str;
    fn call(&self, ctx: &mut HostCallContext<'_>) -> HostOutcome;
}
