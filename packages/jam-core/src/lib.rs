//! JAM node core: PVM execution, service accounts, erasure-coded
//! availability, and the accumulation state-transition engine.
//!
//! The crate is the deterministic heart of a node: wire transports,
//! cryptographic primitives beyond Blake2b-256, and block production feed it
//! decoded inputs and consume its state roots.

pub mod accounts;
pub mod accumulate;
pub mod availability;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod host_functions;
pub mod instructions;
pub mod merkle;
pub mod parser;
pub mod pvm;
pub mod ram;
pub mod state;
pub mod types;
pub mod work;

pub use accounts::{AccountError, PreimageRequest, ServiceAccount};
pub use accumulate::{AccumulateError, AccumulateOutcome, Accumulator};
pub use availability::{segment_package, AvailabilityError, AvailabilityTracker};
pub use config::ChainConfig;
pub use parser::{Program, ProgramError};
pub use pvm::Pvm;
pub use state::{ChainState, PrivilegedState};
pub use types::{DeferredTransfer, Hash, ServiceId, Status, Timeslot};
pub use work::{Segment, WorkItem, WorkPackage, WorkReport, WorkResult};
