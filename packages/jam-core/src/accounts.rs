//! Service accounts: balances, storage, preimages, and the preimage request
//! state machine.
//!
//! `items` and `octets` are derived from the maps rather than stored, so the
//! min-balance invariant cannot drift: a mutator either preserves
//! `balance >= min_balance()` or fails without effect.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::{
    BASE_DEPOSIT, BYTE_DEPOSIT, ITEM_DEPOSIT, REQUEST_ENTRY_OVERHEAD, STORAGE_ENTRY_OVERHEAD,
};
use crate::crypto::blake2b256;
use crate::types::{Balance, Hash, ServiceId, Timeslot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("no preimage request in an applicable state")]
    Huh,
    #[error("balance below the minimum for the new footprint")]
    InsufficientFunds,
}

/// A preimage request: 0–3 timeslots.
///
/// Length encodes the state — 0: requested, unprovided; 1: available since
/// `x`; 2: unavailable since `y` (previously available since `x`);
/// 3: re-available since `z`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreimageRequest(pub Vec<Timeslot>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAccount {
    pub code_hash: Hash,
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    pub preimages: BTreeMap<Hash, Vec<u8>>,
    /// Keyed by (hash, preimage length).
    pub requests: BTreeMap<(Hash, u64), PreimageRequest>,
    pub balance: Balance,
    pub min_acc_gas: u64,
    pub min_memo_gas: u64,
    pub gratis: Balance,
    pub created: Timeslot,
    pub last_acc: Timeslot,
    pub parent: ServiceId,
}

impl ServiceAccount {
    #[must_use]
    pub fn new(code_hash: Hash, parent: ServiceId, created: Timeslot) -> Self {
        Self {
            code_hash,
            storage: BTreeMap::new(),
            preimages: BTreeMap::new(),
            requests: BTreeMap::new(),
            balance: 0,
            min_acc_gas: 0,
            min_memo_gas: 0,
            gratis: 0,
            created,
            last_acc: 0,
            parent,
        }
    }

    /// `2·|requests| + |storage|`.
    #[must_use]
    pub fn items(&self) -> u64 {
        2 * self.requests.len() as u64 + self.storage.len() as u64
    }

    /// `Σ(81 + length)` over requests plus `Σ(34 + |k| + |v|)` over storage.
    #[must_use]
    pub fn octets(&self) -> u64 {
        let requests: u64 = self
            .requests
            .keys()
            .map(|&(_, len)| REQUEST_ENTRY_OVERHEAD + len)
            .sum();
        let storage: u64 = self
            .storage
            .iter()
            .map(|(k, v)| STORAGE_ENTRY_OVERHEAD + k.len() as u64 + v.len() as u64)
            .sum();
        requests + storage
    }

    /// `max(0, BS + BI·items + BL·octets − gratis)`.
    #[must_use]
    pub fn min_balance(&self) -> Balance {
        (BASE_DEPOSIT
            .saturating_add(ITEM_DEPOSIT.saturating_mul(self.items()))
            .saturating_add(BYTE_DEPOSIT.saturating_mul(self.octets())))
        .saturating_sub(self.gratis)
    }

    #[must_use]
    pub fn is_solvent(&self) -> bool {
        self.balance >= self.min_balance()
    }

    /// Write or delete (`None`) a storage cell. Returns the previous value
    /// length; fails without effect when the grown footprint is unaffordable.
    pub fn write_storage(
        &mut self,
        key: &[u8],
        value: Option<Vec<u8>>,
    ) -> Result<Option<usize>, AccountError> {
        match value {
            None => Ok(self.storage.remove(key).map(|v| v.len())),
            Some(value) => {
                let previous = self.storage.insert(key.to_vec(), value);
                if self.is_solvent() {
                    Ok(previous.map(|v| v.len()))
                } else {
                    match previous {
                        Some(old) => {
                            self.storage.insert(key.to_vec(), old);
                        }
                        None => {
                            self.storage.remove(key);
                        }
                    }
                    Err(AccountError::InsufficientFunds)
                }
            }
        }
    }

    /// Request the preimage of `hash` with the given length. A fresh request
    /// enters the unprovided state; a request whose preimage went unavailable
    /// is re-requested by appending the current slot.
    pub fn solicit(&mut self, hash: Hash, len: u64, slot: Timeslot) -> Result<(), AccountError> {
        match self.requests.get_mut(&(hash, len)) {
            None => {
                self.requests.insert((hash, len), PreimageRequest::default());
                if self.is_solvent() {
                    Ok(())
                } else {
                    self.requests.remove(&(hash, len));
                    Err(AccountError::InsufficientFunds)
                }
            }
            Some(request) if request.0.len() == 2 => {
                request.0.push(slot);
                Ok(())
            }
            Some(_) => Err(AccountError::Huh),
        }
    }

    /// Drop a preimage request. An unprovided request is removed outright; a
    /// provided one only once `expiry` slots have elapsed since it was last
    /// relevant, removing the preimage with it. A re-available request
    /// collapses back to the two-slot form.
    pub fn forget(
        &mut self,
        hash: Hash,
        len: u64,
        slot: Timeslot,
        expiry: Timeslot,
    ) -> Result<(), AccountError> {
        let timeslots = self
            .requests
            .get(&(hash, len))
            .ok_or(AccountError::Huh)?
            .0
            .clone();
        match timeslots.as_slice() {
            [] => {
                self.requests.remove(&(hash, len));
                Ok(())
            }
            &[x] if slot.saturating_sub(x) >= expiry => {
                self.requests.remove(&(hash, len));
                self.preimages.remove(&hash);
                Ok(())
            }
            &[_, y] if slot.saturating_sub(y) >= expiry => {
                self.requests.remove(&(hash, len));
                self.preimages.remove(&hash);
                Ok(())
            }
            &[_, y, z] if slot.saturating_sub(y) >= expiry => {
                self.requests
                    .insert((hash, len), PreimageRequest(vec![z, slot]));
                Ok(())
            }
            _ => Err(AccountError::Huh),
        }
    }

    /// Integrate an offered preimage. Only an unprovided request accepts it;
    /// a request whose preimage is already held rejects the offer.
    pub fn provide(&mut self, blob: &[u8], slot: Timeslot) -> Result<(), AccountError> {
        let hash = blake2b256(blob);
        let key = (hash, blob.len() as u64);
        match self.requests.get_mut(&key) {
            Some(request) if request.0.is_empty() => {
                request.0.push(slot);
                self.preimages.insert(hash, blob.to_vec());
                Ok(())
            }
            _ => Err(AccountError::Huh),
        }
    }

    /// True when the preimage for `(hash, len)` is currently usable.
    #[must_use]
    pub fn preimage_available(&self, hash: Hash, len: u64) -> bool {
        self.requests
            .get(&(hash, len))
            .is_some_and(|r| r.0.len() == 1 || r.0.len() == 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PREIMAGE_EXPIRY;

    fn funded_account(balance: Balance) -> ServiceAccount {
        let mut account = ServiceAccount::new([1; 32], 0, 0);
        account.balance = balance;
        account
    }

    #[test]
    fn min_balance_tracks_items_and_octets() {
        let mut account = funded_account(10_000);
        assert_eq!(account.min_balance(), BASE_DEPOSIT);

        account.write_storage(b"key", Some(b"value".to_vec())).unwrap();
        // One storage item: 10 + (34 + 3 + 5) octets.
        assert_eq!(
            account.min_balance(),
            BASE_DEPOSIT + ITEM_DEPOSIT + STORAGE_ENTRY_OVERHEAD + 8
        );

        account.solicit([2; 32], 5, 0).unwrap();
        // A request adds two items and 81 + 5 octets.
        assert_eq!(
            account.min_balance(),
            BASE_DEPOSIT
                + 3 * ITEM_DEPOSIT
                + STORAGE_ENTRY_OVERHEAD
                + 8
                + REQUEST_ENTRY_OVERHEAD
                + 5
        );

        account.gratis = 1_000_000;
        assert_eq!(account.min_balance(), 0);
    }

    #[test]
    fn storage_write_fails_without_effect_when_insolvent() {
        let mut account = funded_account(BASE_DEPOSIT);
        let err = account.write_storage(b"k", Some(b"v".to_vec())).unwrap_err();
        assert_eq!(err, AccountError::InsufficientFunds);
        assert!(account.storage.is_empty());
        assert!(account.is_solvent());
    }

    #[test]
    fn preimage_lifecycle() {
        let mut account = funded_account(10_000);
        let blob = b"abc";
        let hash = blake2b256(blob);

        account.solicit(hash, 3, 100).unwrap();
        assert_eq!(account.requests[&(hash, 3)].0, Vec::<Timeslot>::new());

        account.provide(blob, 105).unwrap();
        assert_eq!(account.requests[&(hash, 3)].0, vec![105]);
        assert_eq!(account.preimages[&hash], blob);
        assert!(account.preimage_available(hash, 3));

        // Too early to forget.
        let err = account.forget(hash, 3, 110, PREIMAGE_EXPIRY).unwrap_err();
        assert_eq!(err, AccountError::Huh);
        assert_eq!(account.requests[&(hash, 3)].0, vec![105]);

        // After expiry the request and the preimage both go.
        account
            .forget(hash, 3, 105 + PREIMAGE_EXPIRY, PREIMAGE_EXPIRY)
            .unwrap();
        assert!(account.requests.is_empty());
        assert!(account.preimages.is_empty());
    }

    #[test]
    fn provided_hash_must_match_a_request() {
        let mut account = funded_account(10_000);
        assert_eq!(account.provide(b"abc", 1), Err(AccountError::Huh));

        // Wrong length: request is for 4 bytes.
        account.solicit(blake2b256(b"abc"), 4, 0).unwrap();
        assert_eq!(account.provide(b"abc", 1), Err(AccountError::Huh));
    }

    #[test]
    fn double_provide_is_rejected() {
        let mut account = funded_account(10_000);
        let hash = blake2b256(b"abc");
        account.solicit(hash, 3, 0).unwrap();
        account.provide(b"abc", 1).unwrap();
        assert_eq!(account.provide(b"abc", 2), Err(AccountError::Huh));
    }

    #[test]
    fn re_request_appends_current_slot() {
        let mut account = funded_account(10_000);
        let hash = blake2b256(b"abc");
        account.requests.insert((hash, 3), PreimageRequest(vec![5, 9]));

        account.solicit(hash, 3, 42).unwrap();
        assert_eq!(account.requests[&(hash, 3)].0, vec![5, 9, 42]);
        assert!(account.preimage_available(hash, 3));

        // Forgetting the re-available request collapses it to [z, t].
        let slot = 9 + PREIMAGE_EXPIRY;
        account.forget(hash, 3, slot, PREIMAGE_EXPIRY).unwrap();
        assert_eq!(account.requests[&(hash, 3)].0, vec![42, slot]);
    }

    #[test]
    fn unprovided_request_is_forgotten_immediately() {
        let mut account = funded_account(10_000);
        let hash = [7; 32];
        account.solicit(hash, 10, 0).unwrap();
        account.forget(hash, 10, 0, PREIMAGE_EXPIRY).unwrap();
        assert!(account.requests.is_empty());
    }

    #[test]
    fn solicit_requires_funding_for_the_footprint() {
        let mut account = funded_account(BASE_DEPOSIT);
        let err = account.solicit([3; 32], 100, 0).unwrap_err();
        assert_eq!(err, AccountError::InsufficientFunds);
        assert!(account.requests.is_empty());
    }
}
