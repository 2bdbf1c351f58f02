//! Host-call surface: sentinel result codes, argument-memory faults, and
//! nested guest machines, exercised against a bare context.

mod common;

use common::{install_service, ProgramBuilder};
use jam_core::accumulate::context::ImplicationsPair;
use jam_core::config::{
    ChainConfig, HOST_CALL_BASE_GAS, HOST_EJECT, HOST_EXPORT, HOST_EXPUNGE, HOST_FETCH, HOST_GAS,
    HOST_INVOKE, HOST_MACHINE, HOST_SOLICIT, HOST_UPGRADE, NUM_REGISTERS, OPCODE_HALT, PAGE_SIZE,
    REG_A0, REG_A1, REG_A2, REG_A3, REG_HUH, REG_OK, REG_WHAT, REG_WHO, SEGMENT_SIZE,
};
use jam_core::host_functions::base::{GuestMachines, HostCallContext, HostOutcome, InvocationPhase};
use jam_core::host_functions::dispatch;
use jam_core::ram::{Memory, PageAccess};
use jam_core::state::PrivilegedState;
use jam_core::types::Registers;
use jam_core::ChainState;

const SCRATCH: u32 = 0x20000;

struct Harness {
    registers: Registers,
    memory: Memory,
    gas: i64,
    pair: ImplicationsPair,
    roles: PrivilegedState,
    guests: GuestMachines,
    config: ChainConfig,
    exports: Option<Vec<Vec<u8>>>,
}

impl Harness {
    fn new(state: ChainState) -> Self {
        let mut memory = Memory::new();
        memory.map_region(SCRATCH, 4 * PAGE_SIZE, PageAccess::ReadWrite, &[]);
        Self {
            registers: [0; NUM_REGISTERS],
            memory,
            gas: 100_000,
            roles: state.privileged.clone(),
            pair: ImplicationsPair::new(state),
            guests: GuestMachines::default(),
            config: ChainConfig::default(),
            exports: None,
        }
    }

    fn dispatch(&mut self, id: u8, service: u32) -> HostOutcome {
        let mut ctx = HostCallContext {
            registers: &mut self.registers,
            memory: &mut self.memory,
            gas: &mut self.gas,
            service_id: service,
            timeslot: 10,
            phase: InvocationPhase::Accumulate,
            pair: &mut self.pair,
            slot_roles: &self.roles,
            config: &self.config,
            entropy: [7; 32],
            work_package: None,
            recent_blocks: &[],
            guests: &mut self.guests,
            exports: self.exports.as_mut(),
        };
        dispatch(u64::from(id), &mut ctx)
    }
}

fn state_with_service(id: u32) -> ChainState {
    let mut state = ChainState::new(&ChainConfig::default());
    install_service(&mut state, id, 100_000, b"not a program");
    state
}

#[test]
fn gas_reports_the_remaining_budget() {
    let mut h = Harness::new(state_with_service(1000));
    assert_eq!(h.dispatch(HOST_GAS, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], (100_000 - HOST_CALL_BASE_GAS) as u64);
}

#[test]
fn unknown_id_writes_what_and_continues() {
    let mut h = Harness::new(state_with_service(1000));
    assert_eq!(h.dispatch(99, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_WHAT);
}

#[test]
fn fetch_serves_the_entropy_accumulator() {
    let mut h = Harness::new(state_with_service(1000));
    h.registers[REG_A0] = u64::from(SCRATCH);
    h.registers[REG_A1] = 0;
    h.registers[REG_A2] = 32;
    h.registers[REG_A3] = 1; // entropy discriminator
    assert_eq!(h.dispatch(HOST_FETCH, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], 32);
    assert_eq!(h.memory.read(SCRATCH, 32).unwrap(), vec![7u8; 32]);
}

#[test]
fn unreadable_argument_memory_faults() {
    let mut h = Harness::new(state_with_service(1000));
    h.registers[REG_A0] = 0x9999_0000; // unmapped hash pointer
    h.registers[REG_A1] = 3;
    assert_eq!(
        h.dispatch(HOST_SOLICIT, 1000),
        HostOutcome::Fault(0x9999_0000)
    );
}

#[test]
fn solicit_and_upgrade_mutate_the_regular_dimension_only() {
    let mut h = Harness::new(state_with_service(1000));
    h.memory.write(SCRATCH, &[0x42; 32]).unwrap();
    h.registers[REG_A0] = u64::from(SCRATCH);
    h.registers[REG_A1] = 5;
    assert_eq!(h.dispatch(HOST_SOLICIT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_OK);

    h.registers[REG_A0] = u64::from(SCRATCH);
    assert_eq!(h.dispatch(HOST_UPGRADE, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_OK);

    let regular = &h.pair.regular.state.accounts[&1000];
    assert!(regular.requests.contains_key(&([0x42; 32], 5)));
    assert_eq!(regular.code_hash, [0x42; 32]);

    let exceptional = &h.pair.exceptional.state.accounts[&1000];
    assert!(exceptional.requests.is_empty());
    assert_ne!(exceptional.code_hash, [0x42; 32]);
}

#[test]
fn eject_requires_the_parent() {
    let mut state = state_with_service(1000);
    install_service(&mut state, 2000, 5_000, b"child code");
    state.accounts.get_mut(&2000).unwrap().parent = 1234; // not 1000
    let mut h = Harness::new(state);
    h.registers[REG_A0] = 2000;
    assert_eq!(h.dispatch(HOST_EJECT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_WHO);
    assert!(h.pair.regular.state.accounts.contains_key(&2000));
}

#[test]
fn eject_refuses_children_holding_preimages() {
    let mut state = state_with_service(1000);
    install_service(&mut state, 2000, 5_000, b"child code");
    state.accounts.get_mut(&2000).unwrap().parent = 1000;
    let mut h = Harness::new(state);
    h.registers[REG_A0] = 2000;
    // install_service seeds the code preimage, so ejection is refused.
    assert_eq!(h.dispatch(HOST_EJECT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_HUH);
}

#[test]
fn eject_folds_the_child_balance_into_the_parent() {
    let mut state = state_with_service(1000);
    install_service(&mut state, 2000, 5_000, b"child code");
    let child = state.accounts.get_mut(&2000).unwrap();
    child.parent = 1000;
    child.preimages.clear();
    let mut h = Harness::new(state);
    h.registers[REG_A0] = 2000;
    assert_eq!(h.dispatch(HOST_EJECT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_OK);
    assert!(!h.pair.regular.state.accounts.contains_key(&2000));
    assert_eq!(h.pair.regular.state.accounts[&1000].balance, 105_000);
}

#[test]
fn export_needs_a_segment_sink() {
    let mut h = Harness::new(state_with_service(1000));
    h.memory.write(SCRATCH, b"segment payload").unwrap();
    h.registers[REG_A0] = u64::from(SCRATCH);
    h.registers[REG_A1] = 15;
    assert_eq!(h.dispatch(HOST_EXPORT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], REG_HUH);

    h.exports = Some(Vec::new());
    h.registers[REG_A0] = u64::from(SCRATCH);
    h.registers[REG_A1] = 15;
    assert_eq!(h.dispatch(HOST_EXPORT, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], 0); // first segment index
    let exports = h.exports.as_ref().unwrap();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].len(), SEGMENT_SIZE);
    assert_eq!(&exports[0][..15], b"segment payload");
}

#[test]
fn guest_machines_run_on_parent_gas() {
    let mut h = Harness::new(state_with_service(1000));
    let guest_blob = ProgramBuilder::new().op(OPCODE_HALT, &[]).build();
    h.memory.write(SCRATCH, &guest_blob).unwrap();

    // machine(program, len, pc = 0)
    h.registers[REG_A0] = u64::from(SCRATCH);
    h.registers[REG_A1] = guest_blob.len() as u64;
    h.registers[REG_A2] = 0;
    assert_eq!(h.dispatch(HOST_MACHINE, 1000), HostOutcome::Continue);
    let machine_id = h.registers[REG_A0];

    // State block: 100 gas, all registers zero.
    let block_at = SCRATCH + 0x1000;
    let mut block = 100i64.to_le_bytes().to_vec();
    block.extend_from_slice(&[0u8; 8 * NUM_REGISTERS]);
    h.memory.write(block_at, &block).unwrap();

    let gas_before = h.gas;
    h.registers[REG_A0] = machine_id;
    h.registers[REG_A1] = u64::from(block_at);
    assert_eq!(h.dispatch(HOST_INVOKE, 1000), HostOutcome::Continue);
    assert_eq!(h.registers[REG_A0], 0); // halt
    // One instruction of guest gas, plus the base charge, came off the parent.
    assert_eq!(h.gas, gas_before - HOST_CALL_BASE_GAS - 1);
    let remaining = h.memory.read(block_at, 8).unwrap();
    assert_eq!(i64::from_le_bytes(remaining.try_into().unwrap()), 99);

    h.registers[REG_A0] = machine_id;
    assert_eq!(h.dispatch(HOST_EXPUNGE, 1000), HostOutcome::Continue);
    h.registers[REG_A0] = machine_id;
    h.dispatch(HOST_EXPUNGE, 1000);
    assert_eq!(h.registers[REG_A0], REG_WHO);
}
