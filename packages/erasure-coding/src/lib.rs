//! Systematic Reed-Solomon erasure coding over fixed-size segments.
//!
//! A work-package bundle is split into `k` data segments of `segment_size`
//! bytes (zero-padded) and extended with `n - k` parity segments computed over
//! GF(2^16). The code is systematic: the first `k` output segments are the
//! data segments byte-for-byte. Reconstruction succeeds from any `k` of the
//! `n` segments.

use reed_solomon_simd::{ReedSolomonDecoder, ReedSolomonEncoder};
use thiserror::Error;

/// Protocol segment size in bytes.
pub const SEGMENT_SIZE: usize = 4096;
/// Protocol data-segment count (k).
pub const DATA_SEGMENTS: usize = 342;
/// Protocol total segment count (n).
pub const TOTAL_SEGMENTS: usize = 1023;

#[derive(Debug, Error)]
pub enum ErasureError {
    #[error("invalid code parameters: k={k}, n={n}, segment_size={segment_size}")]
    InvalidParameters { k: usize, n: usize, segment_size: usize },
    #[error("bundle of {len} bytes exceeds data capacity of {capacity} bytes")]
    BundleTooLarge { len: usize, capacity: usize },
    #[error("segment {index} has length {len}, expected {expected}")]
    SegmentLength { index: usize, len: usize, expected: usize },
    #[error("segment index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("duplicate segment index {0}")]
    DuplicateIndex(usize),
    #[error("{present} segments present, {required} required")]
    NotEnoughSegments { present: usize, required: usize },
    #[error("reed-solomon codec failure: {0}")]
    Codec(String),
}

/// Systematic (k, n) segment codec.
pub struct SegmentCodec {
    k: usize,
    n: usize,
    segment_size: usize,
}

impl SegmentCodec {
    pub fn new(k: usize, n: usize, segment_size: usize) -> Result<Self, ErasureError> {
        // reed-solomon-simd works on 2-byte field elements, so shards must be even-sized.
        if k == 0 || n <= k || segment_size == 0 || segment_size % 2 != 0 {
            return Err(ErasureError::InvalidParameters { k, n, segment_size });
        }
        Ok(Self { k, n, segment_size })
    }

    /// Codec with the protocol parameters (k=342, n=1023, 4096-byte segments).
    pub fn protocol() -> Self {
        Self {
            k: DATA_SEGMENTS,
            n: TOTAL_SEGMENTS,
            segment_size: SEGMENT_SIZE,
        }
    }

    pub fn data_segments(&self) -> usize {
        self.k
    }

    pub fn total_segments(&self) -> usize {
        self.n
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Capacity of one encoded bundle in bytes.
    pub fn capacity(&self) -> usize {
        self.k * self.segment_size
    }

    /// Encode a bundle into `n` segments; the first `k` are the zero-padded data.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, ErasureError> {
        if data.len() > self.capacity() {
            return Err(ErasureError::BundleTooLarge {
                len: data.len(),
                capacity: self.capacity(),
            });
        }

        let mut segments = vec![vec![0u8; self.segment_size]; self.k];
        for (i, chunk) in data.chunks(self.segment_size).enumerate() {
            segments[i][..chunk.len()].copy_from_slice(chunk);
        }

        let mut encoder = ReedSolomonEncoder::new(self.k, self.n - self.k, self.segment_size)
            .map_err(|e| ErasureError::Codec(e.to_string()))?;
        for segment in &segments {
            encoder
                .add_original_shard(segment)
                .map_err(|e| ErasureError::Codec(e.to_string()))?;
        }
        let result = encoder
            .encode()
            .map_err(|e| ErasureError::Codec(e.to_string()))?;
        for parity in result.recovery_iter() {
            segments.push(parity.to_vec());
        }
        Ok(segments)
    }

    /// Reconstruct the full `k * segment_size` data area from any `k`
    /// authenticated `(index, segment)` pairs. Systematic indices are used
    /// directly; the decoder only runs when a data segment is missing.
    pub fn reconstruct(&self, segments: &[(usize, Vec<u8>)]) -> Result<Vec<u8>, ErasureError> {
        let mut seen = vec![false; self.n];
        for &(index, ref segment) in segments {
            if index >= self.n {
                return Err(ErasureError::IndexOutOfRange(index));
            }
            if seen[index] {
                return Err(ErasureError::DuplicateIndex(index));
            }
            seen[index] = true;
            if segment.len() != self.segment_size {
                return Err(ErasureError::SegmentLength {
                    index,
                    len: segment.len(),
                    expected: self.segment_size,
                });
            }
        }
        if segments.len() < self.k {
            return Err(ErasureError::NotEnoughSegments {
                present: segments.len(),
                required: self.k,
            });
        }

        let mut data: Vec<Option<&[u8]>> = vec![None; self.k];
        for &(index, ref segment) in segments {
            if index < self.k {
                data[index] = Some(segment.as_slice());
            }
        }

        if data.iter().all(Option::is_some) {
            let mut out = Vec::with_capacity(self.capacity());
            for segment in data.into_iter().flatten() {
                out.extend_from_slice(segment);
            }
            return Ok(out);
        }

        let mut decoder = ReedSolomonDecoder::new(self.k, self.n - self.k, self.segment_size)
            .map_err(|e| ErasureError::Codec(e.to_string()))?;
        for &(index, ref segment) in segments {
            if index < self.k {
                decoder
                    .add_original_shard(index, segment)
                    .map_err(|e| ErasureError::Codec(e.to_string()))?;
            } else {
                decoder
                    .add_recovery_shard(index - self.k, segment)
                    .map_err(|e| ErasureError::Codec(e.to_string()))?;
            }
        }
        let restored = decoder
            .decode()
            .map_err(|e| ErasureError::Codec(e.to_string()))?;

        let mut out = Vec::with_capacity(self.capacity());
        for (index, provided) in data.iter().enumerate() {
            if let Some(segment) = provided {
                out.extend_from_slice(segment);
            } else {
                let segment = restored
                    .restored_original(index)
                    .ok_or_else(|| ErasureError::Codec(format!("segment {index} not restored")))?;
                out.extend_from_slice(segment);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn bundle(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen()).collect()
    }

    #[test]
    fn systematic_prefix_equals_data() {
        let codec = SegmentCodec::new(4, 10, 64).unwrap();
        let data = bundle(200, 1);
        let segments = codec.encode(&data).unwrap();
        assert_eq!(segments.len(), 10);
        let mut padded = data.clone();
        padded.resize(codec.capacity(), 0);
        for (i, segment) in segments.iter().take(4).enumerate() {
            assert_eq!(&padded[i * 64..(i + 1) * 64], segment.as_slice());
        }
    }

    #[test]
    fn reconstruct_from_any_k_of_n() {
        let codec = SegmentCodec::new(6, 18, 64).unwrap();
        let data = bundle(codec.capacity(), 2);
        let segments = codec.encode(&data).unwrap();

        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..8 {
            let mut indices: Vec<usize> = (0..18).collect();
            indices.shuffle(&mut rng);
            let subset: Vec<(usize, Vec<u8>)> = indices
                .into_iter()
                .take(6)
                .map(|i| (i, segments[i].clone()))
                .collect();
            assert_eq!(codec.reconstruct(&subset).unwrap(), data);
        }
    }

    #[test]
    fn k_minus_one_segments_fail() {
        let codec = SegmentCodec::new(4, 10, 64).unwrap();
        let segments = codec.encode(&bundle(100, 4)).unwrap();
        let subset: Vec<(usize, Vec<u8>)> =
            (0..3).map(|i| (i, segments[i].clone())).collect();
        assert!(matches!(
            codec.reconstruct(&subset),
            Err(ErasureError::NotEnoughSegments { present: 3, required: 4 })
        ));
    }

    #[test]
    fn duplicate_and_out_of_range_indices_rejected() {
        let codec = SegmentCodec::new(2, 6, 64).unwrap();
        let segments = codec.encode(&bundle(64, 5)).unwrap();
        let duplicated = vec![(0usize, segments[0].clone()), (0, segments[0].clone())];
        assert!(matches!(
            codec.reconstruct(&duplicated),
            Err(ErasureError::DuplicateIndex(0))
        ));
        let out_of_range = vec![(6usize, segments[0].clone())];
        assert!(matches!(
            codec.reconstruct(&out_of_range),
            Err(ErasureError::IndexOutOfRange(6))
        ));
    }

    #[test]
    fn protocol_parameters_round_trip() {
        let codec = SegmentCodec::protocol();
        assert_eq!(codec.capacity(), 342 * 4096);
        let data = bundle(100_000, 6);
        let segments = codec.encode(&data).unwrap();
        assert_eq!(segments.len(), TOTAL_SEGMENTS);

        // Drop every data segment, keep parity only: hardest reconstruction.
        let subset: Vec<(usize, Vec<u8>)> = (DATA_SEGMENTS..2 * DATA_SEGMENTS)
            .map(|i| (i, segments[i].clone()))
            .collect();
        let restored = codec.reconstruct(&subset).unwrap();
        assert_eq!(&restored[..data.len()], data.as_slice());
        assert!(restored[data.len()..].iter().all(|&b| b == 0));
    }
}
