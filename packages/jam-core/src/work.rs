//! Work packages, work items, work reports, and segments.
//!
//! The canonical encoding is field declaration order: compact naturals for
//! counts, lengths and gas, fixed-width little-endian for ids and slots, raw
//! bytes for hashes. Packages and reports are content-addressed by the
//! Blake2b-256 of their canonical encoding; decoders reject trailing bytes.

use crate::codec::{decode_exact, encode_natural, CodecError, Reader};
use crate::config::{MAX_PACKAGE_ITEMS, MAX_REPORT_DEPS, SEGMENT_SIZE};
use crate::crypto::blake2b256;
use crate::types::{CoreId, Hash, ServiceId, Timeslot};

/// Context anchoring a refinement to the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefineContext {
    pub anchor: Hash,
    pub state_root: Hash,
    pub accumulation_root: Hash,
    pub lookup_anchor: Hash,
    pub lookup_slot: Timeslot,
    pub prerequisites: Vec<Hash>,
}

impl RefineContext {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.anchor);
        out.extend_from_slice(&self.state_root);
        out.extend_from_slice(&self.accumulation_root);
        out.extend_from_slice(&self.lookup_anchor);
        out.extend_from_slice(&self.lookup_slot.to_le_bytes());
        out.extend(encode_natural(self.prerequisites.len() as u64));
        for hash in &self.prerequisites {
            out.extend_from_slice(hash);
        }
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let anchor = r.hash()?;
        let state_root = r.hash()?;
        let accumulation_root = r.hash()?;
        let lookup_anchor = r.hash()?;
        let lookup_slot = r.u32_le()?;
        let count = r.bounded_natural(MAX_REPORT_DEPS as u64)?;
        let mut prerequisites = Vec::with_capacity(count as usize);
        for _ in 0..count {
            prerequisites.push(r.hash()?);
        }
        Ok(Self {
            anchor,
            state_root,
            accumulation_root,
            lookup_anchor,
            lookup_slot,
            prerequisites,
        })
    }
}

/// One unit of work within a package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkItem {
    pub service: ServiceId,
    pub payload: Vec<u8>,
    pub gas_limit: u64,
    pub output_limit: u32,
    pub storage_limit: u32,
}

impl WorkItem {
    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.service.to_le_bytes());
        out.extend(encode_natural(self.payload.len() as u64));
        out.extend_from_slice(&self.payload);
        out.extend(encode_natural(self.gas_limit));
        out.extend_from_slice(&self.output_limit.to_le_bytes());
        out.extend_from_slice(&self.storage_limit.to_le_bytes());
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            service: r.u32_le()?,
            payload: r.blob()?.to_vec(),
            gas_limit: r.natural()?,
            output_limit: r.u32_le()?,
            storage_limit: r.u32_le()?,
        })
    }
}

/// A signed bundle of work items bound to an authorizer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkPackage {
    pub auth_token: Vec<u8>,
    pub auth_service: ServiceId,
    pub auth_code_hash: Hash,
    pub context: RefineContext,
    pub items: Vec<WorkItem>,
}

impl WorkPackage {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(encode_natural(self.auth_token.len() as u64));
        out.extend_from_slice(&self.auth_token);
        out.extend_from_slice(&self.auth_service.to_le_bytes());
        out.extend_from_slice(&self.auth_code_hash);
        self.context.write(&mut out);
        out.extend(encode_natural(self.items.len() as u64));
        for item in &self.items {
            item.write(&mut out);
        }
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        decode_exact(data, |r| {
            let auth_token = r.blob()?.to_vec();
            let auth_service = r.u32_le()?;
            let auth_code_hash = r.hash()?;
            let context = RefineContext::read(r)?;
            let count = r.bounded_natural(MAX_PACKAGE_ITEMS as u64)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(WorkItem::read(r)?);
            }
            Ok(Self {
                auth_token,
                auth_service,
                auth_code_hash,
                context,
                items,
            })
        })
    }

    /// Content address: Blake2b-256 of the canonical encoding.
    #[must_use]
    pub fn hash(&self) -> Hash {
        blake2b256(&self.encode())
    }
}

/// The outcome of one work item's refinement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkResult {
    pub service: ServiceId,
    /// Gas limit this result grants to the service's accumulation.
    pub gas: u64,
    pub output: Vec<u8>,
}

impl WorkResult {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.service.to_le_bytes());
        out.extend(encode_natural(self.gas));
        out.extend(encode_natural(self.output.len() as u64));
        out.extend_from_slice(&self.output);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            service: r.u32_le()?,
            gas: r.natural()?,
            output: r.blob()?.to_vec(),
        })
    }
}

/// The refinement output consumed by accumulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkReport {
    pub package_hash: Hash,
    pub core: CoreId,
    /// Merkle root over the package's erasure-coded segments.
    pub segments_root: Hash,
    /// Byte length of the encoded package before zero padding.
    pub bundle_len: u32,
    pub results: Vec<WorkResult>,
}

impl WorkReport {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.package_hash);
        out.extend_from_slice(&self.core.to_le_bytes());
        out.extend_from_slice(&self.segments_root);
        out.extend_from_slice(&self.bundle_len.to_le_bytes());
        out.extend(encode_natural(self.results.len() as u64));
        for result in &self.results {
            result.write(&mut out);
        }
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        decode_exact(data, |r| {
            let package_hash = r.hash()?;
            let core = r.u16_le()?;
            let segments_root = r.hash()?;
            let bundle_len = r.u32_le()?;
            let count = r.natural()?;
            let mut results = Vec::with_capacity(count.min(64) as usize);
            for _ in 0..count {
                results.push(WorkResult::read(r)?);
            }
            Ok(Self {
                package_hash,
                core,
                segments_root,
                bundle_len,
                results,
            })
        })
    }

    #[must_use]
    pub fn hash(&self) -> Hash {
        blake2b256(&self.encode())
    }
}

/// One erasure-coded unit of a published work package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub index: u16,
    pub core: CoreId,
    pub package_hash: Hash,
    /// Exactly [`SEGMENT_SIZE`] bytes.
    pub data: Vec<u8>,
    /// Merkle authentication path against the report's segments root.
    pub proof: Vec<Hash>,
}

impl Segment {
    /// Leaf hash used in the segments tree.
    #[must_use]
    pub fn leaf(&self) -> Hash {
        blake2b256(&self.data)
    }

    #[must_use]
    pub fn well_formed(&self) -> bool {
        self.data.len() == SEGMENT_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecErrorKind;

    fn sample_package() -> WorkPackage {
        WorkPackage {
            auth_token: vec![0xaa; 16],
            auth_service: 7,
            auth_code_hash: [2; 32],
            context: RefineContext {
                anchor: [3; 32],
                state_root: [4; 32],
                accumulation_root: [5; 32],
                lookup_anchor: [6; 32],
                lookup_slot: 42,
                prerequisites: vec![[7; 32], [8; 32]],
            },
            items: vec![
                WorkItem {
                    service: 65_536,
                    payload: b"payload".to_vec(),
                    gas_limit: 1_000_000,
                    output_limit: 4096,
                    storage_limit: 1 << 20,
                },
                WorkItem::default(),
            ],
        }
    }

    #[test]
    fn package_round_trip_and_stable_hash() {
        let package = sample_package();
        let encoded = package.encode();
        assert_eq!(WorkPackage::decode(&encoded).unwrap(), package);
        assert_eq!(package.hash(), blake2b256(&encoded));
    }

    #[test]
    fn package_decode_rejects_trailing_bytes() {
        let mut encoded = sample_package().encode();
        encoded.push(0);
        assert_eq!(
            WorkPackage::decode(&encoded).unwrap_err().kind,
            CodecErrorKind::TrailingBytes
        );
    }

    #[test]
    fn item_count_above_protocol_limit_rejected() {
        let mut package = sample_package();
        package.items = vec![WorkItem::default(); MAX_PACKAGE_ITEMS + 1];
        assert_eq!(
            WorkPackage::decode(&package.encode()).unwrap_err().kind,
            CodecErrorKind::LengthLimit
        );
    }

    #[test]
    fn report_round_trip() {
        let report = WorkReport {
            package_hash: [9; 32],
            core: 12,
            segments_root: [10; 32],
            bundle_len: 12_345,
            results: vec![
                WorkResult {
                    service: 65_536,
                    gas: 500_000,
                    output: b"ok".to_vec(),
                },
                WorkResult {
                    service: 65_537,
                    gas: 1,
                    output: vec![],
                },
            ],
        };
        assert_eq!(WorkReport::decode(&report.encode()).unwrap(), report);
    }
}
