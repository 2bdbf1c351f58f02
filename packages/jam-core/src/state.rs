//! Chain state: service accounts, privileged roles, and the deterministic
//! state root.
//!
//! The persisted layout is a flat key-value space keyed by the canonical
//! encoding of `(service_id, subkey)`; subkey tags: 0 account header,
//! 1 storage cell, 2 preimage, 3 request. The state root is the binary
//! Merkle root over `blake2b256(key ‖ value)` leaves in sorted key order.

use std::collections::BTreeMap;

use crate::accounts::ServiceAccount;
use crate::codec::encode_natural;
use crate::config::{ChainConfig, MIN_PUBLIC_SERVICE_ID};
use crate::crypto::blake2b256;
use crate::merkle::merkle_root;
use crate::types::{Hash, ServiceId, Timeslot};

/// Chain-wide privileged roles and per-core assignments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivilegedState {
    pub manager: ServiceId,
    pub delegator: ServiceId,
    pub registrar: ServiceId,
    /// Per-core service allowed to reassign that core's authorization queue.
    pub assigners: Vec<ServiceId>,
    /// Incoming validator descriptors (336-byte key blobs).
    pub staging_set: Vec<Vec<u8>>,
    /// Per-core queue of authorizer hashes.
    pub auth_queue: Vec<Vec<Hash>>,
    /// Services accumulated every timeslot with the given gas, reports or not.
    pub always_access: Vec<(ServiceId, u64)>,
}

impl PrivilegedState {
    #[must_use]
    pub fn for_config(config: &ChainConfig) -> Self {
        let cores = usize::from(config.core_count);
        Self {
            manager: 0,
            delegator: 0,
            registrar: 0,
            assigners: vec![0; cores],
            staging_set: Vec::new(),
            auth_queue: vec![Vec::new(); cores],
            always_access: Vec::new(),
        }
    }
}

impl Default for PrivilegedState {
    fn default() -> Self {
        Self::for_config(&ChainConfig::default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainState {
    pub accounts: BTreeMap<ServiceId, ServiceAccount>,
    pub privileged: PrivilegedState,
    /// Next candidate id for publicly created services.
    pub next_free_id: ServiceId,
}

impl ChainState {
    #[must_use]
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            accounts: BTreeMap::new(),
            privileged: PrivilegedState::for_config(config),
            next_free_id: MIN_PUBLIC_SERVICE_ID,
        }
    }

    /// Project the account space onto the flat persisted layout.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut keyvals = BTreeMap::new();
        for (&id, account) in &self.accounts {
            keyvals.insert(account_key(id), encode_account_header(account));
            for (key, value) in &account.storage {
                keyvals.insert(storage_key(id, key), value.clone());
            }
            for (hash, blob) in &account.preimages {
                keyvals.insert(preimage_key(id, hash), blob.clone());
            }
            for (&(hash, len), request) in &account.requests {
                keyvals.insert(request_key(id, &hash, len), encode_timeslots(&request.0));
            }
        }
        keyvals
    }

    /// Deterministic root over the sorted flat layout.
    #[must_use]
    pub fn root(&self) -> Hash {
        let leaves: Vec<Hash> = self
            .flatten()
            .iter()
            .map(|(key, value)| {
                let mut leaf = key.clone();
                leaf.extend_from_slice(value);
                blake2b256(&leaf)
            })
            .collect();
        merkle_root(&leaves)
    }
}

// ============================================================================
// Canonical keys and values
// ============================================================================

#[must_use]
pub fn account_key(id: ServiceId) -> Vec<u8> {
    let mut key = id.to_le_bytes().to_vec();
    key.push(0);
    key
}

#[must_use]
pub fn storage_key(id: ServiceId, storage_key: &[u8]) -> Vec<u8> {
    let mut key = id.to_le_bytes().to_vec();
    key.push(1);
    key.extend_from_slice(storage_key);
    key
}

#[must_use]
pub fn preimage_key(id: ServiceId, hash: &Hash) -> Vec<u8> {
    let mut key = id.to_le_bytes().to_vec();
    key.push(2);
    key.extend_from_slice(hash);
    key
}

#[must_use]
pub fn request_key(id: ServiceId, hash: &Hash, len: u64) -> Vec<u8> {
    let mut key = id.to_le_bytes().to_vec();
    key.push(3);
    key.extend_from_slice(hash);
    key.extend_from_slice(&(len as u32).to_le_bytes());
    key
}

/// Account header: code hash, balance, gas floors, gratis, octets, items,
/// created, last accumulation, parent.
#[must_use]
pub fn encode_account_header(account: &ServiceAccount) -> Vec<u8> {
    let mut out = Vec::with_capacity(90);
    out.extend_from_slice(&account.code_hash);
    out.extend_from_slice(&account.balance.to_le_bytes());
    out.extend_from_slice(&account.min_acc_gas.to_le_bytes());
    out.extend_from_slice(&account.min_memo_gas.to_le_bytes());
    out.extend_from_slice(&account.gratis.to_le_bytes());
    out.extend_from_slice(&account.octets().to_le_bytes());
    out.extend_from_slice(&(account.items() as u32).to_le_bytes());
    out.extend_from_slice(&account.created.to_le_bytes());
    out.extend_from_slice(&account.last_acc.to_le_bytes());
    out.extend_from_slice(&account.parent.to_le_bytes());
    out
}

fn encode_timeslots(timeslots: &[Timeslot]) -> Vec<u8> {
    let mut out = encode_natural(timeslots.len() as u64);
    for &slot in timeslots {
        out.extend_from_slice(&slot.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZERO_HASH;

    fn state_with_account() -> ChainState {
        let config = ChainConfig::default();
        let mut state = ChainState::new(&config);
        let mut account = ServiceAccount::new([1; 32], 0, 0);
        account.balance = 10_000;
        account.write_storage(b"k", Some(b"v".to_vec())).unwrap();
        account.solicit([2; 32], 7, 3).unwrap();
        state.accounts.insert(42, account);
        state
    }

    #[test]
    fn flatten_emits_every_subkey_kind() {
        let state = state_with_account();
        let flat = state.flatten();
        assert!(flat.contains_key(&account_key(42)));
        assert!(flat.contains_key(&storage_key(42, b"k")));
        assert!(flat.contains_key(&request_key(42, &[2; 32], 7)));
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn root_is_deterministic_and_sensitive_to_state() {
        let state = state_with_account();
        let root = state.root();
        assert_eq!(root, state.clone().root());
        assert_ne!(root, ZERO_HASH);

        let mut changed = state.clone();
        changed
            .accounts
            .get_mut(&42)
            .unwrap()
            .write_storage(b"k", Some(b"w".to_vec()))
            .unwrap();
        assert_ne!(changed.root(), root);
    }

    #[test]
    fn empty_state_has_zero_root() {
        assert_eq!(ChainState::new(&ChainConfig::default()).root(), ZERO_HASH);
    }
}
