//! The accumulation engine: fold a timeslot's work reports into state.
//!
//! Reports are grouped by service in canonical order and each service's
//! `accumulate` export runs over an [`ImplicationsPair`]; a halt commits the
//! regular dimension, any exceptional exit commits the checkpoint. Deferred
//! transfers fire after the batch, provisions apply at end of timeslot, and
//! the whole transition lands only if every account is left solvent.

pub mod context;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::accounts::ServiceAccount;
use crate::accumulate::context::ImplicationsPair;
use crate::codec::encode_natural;
use crate::config::{ChainConfig, EXPORT_ACCUMULATE, EXPORT_ON_TRANSFER};
use crate::crypto::blake2b256;
use crate::host_functions::base::{GuestMachines, HostCallContext, HostOutcome, InvocationPhase};
use crate::host_functions::dispatch;
use crate::parser::Program;
use crate::pvm::Pvm;
use crate::state::{ChainState, PrivilegedState};
use crate::types::{DeferredTransfer, Hash, ServiceId, Status, Timeslot};
use crate::work::{WorkReport, WorkResult};

#[derive(Debug, Error)]
pub enum AccumulateError {
    /// Fatal: the committed state would leave an account insolvent. The
    /// batch is rejected and no state change applies.
    #[error("account {0} left insolvent by the committed state")]
    SolvencyViolation(ServiceId),
}

/// What one timeslot's accumulation produced.
#[derive(Debug, Default)]
pub struct AccumulateOutcome {
    /// Yield hashes per accumulated service.
    pub yields: BTreeMap<ServiceId, Hash>,
    /// Services whose `accumulate` export was invoked, in order.
    pub accumulated: Vec<ServiceId>,
    /// Deferred transfers delivered this timeslot.
    pub transfers_fired: usize,
}

/// Per-invocation result of a PVM run.
struct Invocation {
    halted: bool,
    status: Status,
}

/// The engine. Holds the transfers enqueued during `on_transfer` handling,
/// which fire at the next timeslot.
pub struct Accumulator {
    config: ChainConfig,
    pending: Vec<DeferredTransfer>,
    /// Entropy accumulator served to guests via `fetch`.
    pub entropy: Hash,
    /// Recent block hashes served to guests via `fetch`, newest last.
    pub recent_blocks: Vec<Hash>,
}

impl Accumulator {
    #[must_use]
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            entropy: [0; 32],
            recent_blocks: Vec::new(),
        }
    }

    /// Transfers waiting for the next timeslot.
    #[must_use]
    pub fn pending_transfers(&self) -> &[DeferredTransfer] {
        &self.pending
    }

    /// Fold one timeslot's reports into `state`. On error the state and the
    /// pending transfer queue are untouched.
    pub fn accumulate(
        &mut self,
        state: &mut ChainState,
        slot: Timeslot,
        reports: &[WorkReport],
    ) -> Result<AccumulateOutcome, AccumulateError> {
        let mut working = state.clone();
        let mut outcome = AccumulateOutcome::default();

        // Canonical grouping: service ids ascending, results in batch order.
        let mut batches: BTreeMap<ServiceId, Vec<WorkResult>> = BTreeMap::new();
        for report in reports {
            for result in &report.results {
                batches.entry(result.service).or_default().push(result.clone());
            }
        }
        let always_gas: BTreeMap<ServiceId, u64> =
            working.privileged.always_access.iter().copied().collect();
        for &service in always_gas.keys() {
            batches.entry(service).or_default();
        }

        let mut provisions: Vec<(ServiceId, Vec<u8>)> = Vec::new();
        let mut transfer_queue: Vec<DeferredTransfer> = self.pending.clone();
        // Role checks hold the slot-start assignments for the whole batch;
        // updates ride the commits and take effect at the boundary.
        let slot_roles = working.privileged.clone();

        for (&service, results) in &batches {
            let Some(account) = working.accounts.get(&service) else {
                debug!(service, "reports for unknown service skipped");
                continue;
            };
            let granted: u64 = results
                .iter()
                .map(|r| r.gas)
                .sum::<u64>()
                .saturating_add(always_gas.get(&service).copied().unwrap_or(0));
            let gas = granted.max(account.min_acc_gas);
            let Some(program) = service_program(account) else {
                debug!(service, "service code unavailable; skipped");
                continue;
            };

            let args = encode_accumulate_args(slot, service, results);
            let mut pair = ImplicationsPair::new(working.clone());
            let invocation = self.invoke(
                program,
                EXPORT_ACCUMULATE,
                &args,
                gas,
                InvocationPhase::Accumulate,
                service,
                slot,
                &slot_roles,
                &mut pair,
            );
            debug!(
                service,
                status = invocation.status.code(),
                committed = invocation.halted,
                "accumulate invocation"
            );

            let committed = pair.commit(invocation.halted);
            working = committed.state;
            if let Some(account) = working.accounts.get_mut(&service) {
                account.last_acc = slot;
            }
            transfer_queue.extend(committed.xfers);
            provisions.extend(committed.provisions);
            if let Some(hash) = committed.yield_hash {
                outcome.yields.insert(service, hash);
            }
            outcome.accumulated.push(service);
        }

        // Deferred transfers fire once all accumulations are done; the
        // boundary has passed, so updated roles are now authoritative.
        // Transfers enqueued by the handlers below go to the next timeslot.
        let boundary_roles = working.privileged.clone();
        let mut next_pending: Vec<DeferredTransfer> = Vec::new();
        for transfer in transfer_queue {
            match working.accounts.get_mut(&transfer.dest) {
                None => {
                    // Destination vanished: the amount returns to the source.
                    if let Some(source) = working.accounts.get_mut(&transfer.source) {
                        source.balance = source.balance.saturating_add(transfer.amount);
                    }
                    continue;
                }
                Some(dest) => {
                    dest.balance = dest.balance.saturating_add(transfer.amount);
                }
            }
            outcome.transfers_fired += 1;

            let program = working
                .accounts
                .get(&transfer.dest)
                .and_then(service_program);
            let Some(program) = program else {
                continue;
            };
            let args = encode_transfer_args(slot, &transfer);
            let mut pair = ImplicationsPair::new(working.clone());
            let invocation = self.invoke(
                program,
                EXPORT_ON_TRANSFER,
                &args,
                transfer.gas,
                InvocationPhase::OnTransfer,
                transfer.dest,
                slot,
                &boundary_roles,
                &mut pair,
            );
            let committed = pair.commit(invocation.halted);
            working = committed.state;
            if let Some(account) = working.accounts.get_mut(&transfer.dest) {
                account.last_acc = slot;
            }
            next_pending.extend(committed.xfers);
            provisions.extend(committed.provisions);
        }

        // Provisions apply at end of timeslot in (service, hash) order.
        provisions.sort_by_key(|(service, blob)| (*service, blake2b256(blob)));
        for (service, blob) in provisions {
            let Some(account) = working.accounts.get_mut(&service) else {
                continue;
            };
            if account.provide(&blob, slot).is_err() {
                debug!(service, "stale provision dropped");
            }
        }

        for (&id, account) in &working.accounts {
            if !account.is_solvent() {
                warn!(service = id, "batch rejected: committed state insolvent");
                return Err(AccumulateError::SolvencyViolation(id));
            }
        }

        *state = working;
        self.pending = next_pending;
        Ok(outcome)
    }

    /// Run one export of a service program to completion, dispatching host
    /// calls against the implications pair.
    #[allow(clippy::too_many_arguments)]
    fn invoke(
        &self,
        program: Program,
        export: usize,
        args: &[u8],
        gas: u64,
        phase: InvocationPhase,
        service: ServiceId,
        slot: Timeslot,
        slot_roles: &PrivilegedState,
        pair: &mut ImplicationsPair,
    ) -> Invocation {
        let mut vm = Pvm::new(program, i64::try_from(gas).unwrap_or(i64::MAX));
        vm.set_args(args);
        vm.start_at_export(export);
        let mut guests = GuestMachines::default();

        loop {
            match vm.run() {
                Status::Host => {
                    let id = vm.host_call_id();
                    let outcome = {
                        let mut ctx = HostCallContext {
                            registers: &mut vm.registers,
                            memory: &mut vm.memory,
                            gas: &mut vm.gas,
                            service_id: service,
                            timeslot: slot,
                            phase,
                            pair: &mut *pair,
                            slot_roles,
                            config: &self.config,
                            entropy: self.entropy,
                            work_package: None,
                            recent_blocks: &self.recent_blocks,
                            guests: &mut guests,
                            exports: None,
                        };
                        dispatch(id, &mut ctx)
                    };
                    match outcome {
                        HostOutcome::Continue => vm.resume_after_host(),
                        HostOutcome::Fault(_) => {
                            return Invocation {
                                halted: false,
                                status: Status::Fault,
                            }
                        }
                        HostOutcome::OutOfGas => {
                            return Invocation {
                                halted: false,
                                status: Status::OutOfGas,
                            }
                        }
                    }
                }
                status => {
                    return Invocation {
                        halted: status == Status::Halt,
                        status,
                    }
                }
            }
        }
    }
}

/// The service's executable: the preimage of its code hash.
fn service_program(account: &ServiceAccount) -> Option<Program> {
    let code = account.preimages.get(&account.code_hash)?;
    match Program::parse(code) {
        Ok(program) => Some(program),
        Err(error) => {
            warn!(%error, "service code does not parse");
            None
        }
    }
}

/// Arguments to `accumulate`: timeslot, service id, then the work results.
fn encode_accumulate_args(slot: Timeslot, service: ServiceId, results: &[WorkResult]) -> Vec<u8> {
    let mut out = encode_natural(u64::from(slot));
    out.extend(encode_natural(u64::from(service)));
    out.extend(encode_natural(results.len() as u64));
    for result in results {
        out.extend(result.encode());
    }
    out
}

/// Arguments to `on_transfer`: timeslot, then the fired transfer.
fn encode_transfer_args(slot: Timeslot, transfer: &DeferredTransfer) -> Vec<u8> {
    let mut out = encode_natural(u64::from(slot));
    out.extend(transfer.encode());
    out
}
