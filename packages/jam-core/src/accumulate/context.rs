//! Implications context: the working state of one invocation and its
//! exceptional checkpoint.
//!
//! The pair is two owned values. `imX` (regular) absorbs every effect as host
//! calls run; `checkpoint` copies it into `imY` (exceptional). A halting
//! invocation commits `imX`; panic, fault, or gas exhaustion commits `imY` —
//! which, if no checkpoint was ever taken, is still the initial state, so all
//! effects unwind.

use crate::state::ChainState;
use crate::types::{DeferredTransfer, Hash, ServiceId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Implications {
    pub state: ChainState,
    pub xfers: Vec<DeferredTransfer>,
    pub yield_hash: Option<Hash>,
    /// Preimages offered via `provide`, applied at end of timeslot.
    pub provisions: Vec<(ServiceId, Vec<u8>)>,
}

impl Implications {
    #[must_use]
    pub fn new(state: ChainState) -> Self {
        Self {
            state,
            xfers: Vec::new(),
            yield_hash: None,
            provisions: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplicationsPair {
    pub regular: Implications,
    pub exceptional: Implications,
}

impl ImplicationsPair {
    /// Both dimensions start as deep copies of the pre-invocation state.
    #[must_use]
    pub fn new(state: ChainState) -> Self {
        let regular = Implications::new(state);
        Self {
            exceptional: regular.clone(),
            regular,
        }
    }

    /// `imY ← imX`.
    pub fn checkpoint(&mut self) {
        self.exceptional = self.regular.clone();
    }

    /// Pick the dimension to persist for a normal (`halted`) or exceptional
    /// exit.
    #[must_use]
    pub fn commit(self, halted: bool) -> Implications {
        if halted {
            self.regular
        } else {
            self.exceptional
        }
    }
}
