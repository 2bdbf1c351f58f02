//! Erasure-coded availability tracker.
//!
//! Packages are registered from their work report (segments root and bundle
//! length); segments are then accepted one at a time, each authenticated
//! against the root before it counts. When the data-segment threshold K is
//! reached the package becomes reconstructable. The map sits behind one
//! mutex: `add_segment` is a short critical section safe to call from
//! parallel verification threads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use jam_reed_solomon::{ErasureError, SegmentCodec};
use thiserror::Error;
use tracing::debug;

use crate::crypto::blake2b256;
use crate::merkle::{merkle_proof, merkle_root, verify_proof};
use crate::types::{CoreId, Hash};
use crate::work::{Segment, WorkPackage, WorkReport};

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("package is not registered")]
    UnknownPackage,
    #[error("segment index {0} out of range")]
    IndexOutOfRange(u16),
    #[error("segment {0} already held")]
    DuplicateSegment(u16),
    #[error("segment {0} has the wrong length")]
    BadLength(u16),
    #[error("segment {0} fails authentication against the segments root")]
    BadProof(u16),
    /// Fatal: K authenticated segments produced an inconsistent package.
    #[error("reconstruction failed: {0}")]
    ReconstructionFailed(String),
}

/// A work package split into authenticated segments, ready to publish.
pub struct SegmentedPackage {
    pub package_hash: Hash,
    pub segments_root: Hash,
    pub bundle_len: u32,
    pub segments: Vec<Segment>,
}

/// Erasure-code a package into N authenticated segments.
pub fn segment_package(
    package: &WorkPackage,
    core: CoreId,
) -> Result<SegmentedPackage, ErasureError> {
    let bundle = package.encode();
    let shards = SegmentCodec::protocol().encode(&bundle)?;
    let leaves: Vec<Hash> = shards.iter().map(|s| blake2b256(s)).collect();
    let segments_root = merkle_root(&leaves);
    let package_hash = blake2b256(&bundle);
    let segments = shards
        .into_iter()
        .enumerate()
        .map(|(index, data)| Segment {
            index: index as u16,
            core,
            package_hash,
            data,
            proof: merkle_proof(&leaves, index).expect("index within leaf count"),
        })
        .collect();
    Ok(SegmentedPackage {
        package_hash,
        segments_root,
        bundle_len: bundle.len() as u32,
        segments,
    })
}

struct PackageEntry {
    segments_root: Hash,
    bundle_len: u32,
    segments: BTreeMap<u16, Vec<u8>>,
    complete: bool,
}

#[derive(Default)]
pub struct AvailabilityTracker {
    inner: Mutex<HashMap<Hash, PackageEntry>>,
}

impl AvailabilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a package from its work report. Re-registration is a no-op.
    pub fn register_report(&self, report: &WorkReport) {
        let mut inner = self.inner.lock().expect("availability lock");
        inner
            .entry(report.package_hash)
            .or_insert_with(|| PackageEntry {
                segments_root: report.segments_root,
                bundle_len: report.bundle_len,
                segments: BTreeMap::new(),
                complete: false,
            });
    }

    /// Accept one authenticated segment. Returns true when this segment
    /// first makes the package reconstructable.
    pub fn add_segment(&self, segment: &Segment) -> Result<bool, AvailabilityError> {
        let codec = SegmentCodec::protocol();
        if usize::from(segment.index) >= codec.total_segments() {
            return Err(AvailabilityError::IndexOutOfRange(segment.index));
        }
        if !segment.well_formed() {
            return Err(AvailabilityError::BadLength(segment.index));
        }
        let leaf = segment.leaf();

        let mut inner = self.inner.lock().expect("availability lock");
        let entry = inner
            .get_mut(&segment.package_hash)
            .ok_or(AvailabilityError::UnknownPackage)?;
        if !verify_proof(
            &leaf,
            usize::from(segment.index),
            &segment.proof,
            &entry.segments_root,
        ) {
            return Err(AvailabilityError::BadProof(segment.index));
        }
        if entry.segments.contains_key(&segment.index) {
            return Err(AvailabilityError::DuplicateSegment(segment.index));
        }
        entry.segments.insert(segment.index, segment.data.clone());
        if !entry.complete && entry.segments.len() >= codec.data_segments() {
            entry.complete = true;
            debug!(
                package = %hex_prefix(&segment.package_hash),
                "package reconstructable"
            );
            return Ok(true);
        }
        Ok(false)
    }

    #[must_use]
    pub fn is_available(&self, package_hash: &Hash) -> bool {
        let inner = self.inner.lock().expect("availability lock");
        inner.get(package_hash).is_some_and(|e| e.complete)
    }

    /// Decode the package from any K held segments, preferring systematic
    /// indices. Returns `None` until the package is complete. A failure after
    /// K authenticated segments is a node-level invariant violation.
    pub fn reconstruct(
        &self,
        package_hash: &Hash,
    ) -> Result<Option<WorkPackage>, AvailabilityError> {
        let codec = SegmentCodec::protocol();
        let (shards, bundle_len) = {
            let inner = self.inner.lock().expect("availability lock");
            let Some(entry) = inner.get(package_hash) else {
                return Err(AvailabilityError::UnknownPackage);
            };
            if !entry.complete {
                return Ok(None);
            }
            // BTreeMap iteration is ascending, so systematic indices come
            // first when present.
            let shards: Vec<(usize, Vec<u8>)> = entry
                .segments
                .iter()
                .take(codec.data_segments())
                .map(|(&index, data)| (usize::from(index), data.clone()))
                .collect();
            (shards, entry.bundle_len as usize)
        };

        let data = codec
            .reconstruct(&shards)
            .map_err(|e| AvailabilityError::ReconstructionFailed(e.to_string()))?;
        if bundle_len > data.len() || data[bundle_len..].iter().any(|&b| b != 0) {
            return Err(AvailabilityError::ReconstructionFailed(
                "nonzero padding beyond the bundle length".into(),
            ));
        }
        let bundle = &data[..bundle_len];
        if blake2b256(bundle) != *package_hash {
            return Err(AvailabilityError::ReconstructionFailed(
                "decoded bundle does not hash to the package address".into(),
            ));
        }
        let package = WorkPackage::decode(bundle)
            .map_err(|e| AvailabilityError::ReconstructionFailed(e.to_string()))?;
        Ok(Some(package))
    }

    /// Garbage-collect a package after accumulation.
    pub fn remove(&self, package_hash: &Hash) {
        let mut inner = self.inner.lock().expect("availability lock");
        inner.remove(package_hash);
    }
}

fn hex_prefix(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}
