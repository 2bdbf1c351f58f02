//! Canonical serialization (Gray Paper): compact naturals, length-prefixed
//! blobs, optionals, fixed-width little-endian scalars.
//!
//! Decoding goes through [`Reader`], a cursor that fails with a structured
//! [`CodecError`] carrying the byte offset. Decoders reject trailing bytes
//! (`decode_exact`) and non-minimal natural encodings.

use thiserror::Error;

use crate::types::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CodecErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("non-canonical natural encoding")]
    NonCanonical,
    #[error("trailing bytes after value")]
    TrailingBytes,
    #[error("invalid discriminant")]
    InvalidDiscriminant,
    #[error("length exceeds protocol limit")]
    LengthLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("codec error at byte {offset}: {kind}")]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub offset: usize,
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a natural number, minimal-length.
///
/// `0` is a single zero byte; values below 2^7 are a single byte; otherwise a
/// prefix byte with `l` leading ones carries the high bits, followed by the
/// low `8l` bits little-endian; values at or above 2^56 use `0xFF` plus eight
/// little-endian bytes.
#[must_use]
pub fn encode_natural(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    if value < 1 << 7 {
        return vec![value as u8];
    }
    if value >= 1 << 56 {
        let mut out = Vec::with_capacity(9);
        out.push(0xff);
        out.extend_from_slice(&value.to_le_bytes());
        return out;
    }
    let mut l = 1u32;
    while value >= 1 << (7 * (l + 1)) {
        l += 1;
    }
    let prefix = (256 - (1u64 << (8 - l))) + (value >> (8 * l));
    let mut out = Vec::with_capacity(1 + l as usize);
    out.push(prefix as u8);
    out.extend_from_slice(&value.to_le_bytes()[..l as usize]);
    out
}

/// Length-prefixed blob: `encode_natural(len) ++ bytes`.
#[must_use]
pub fn encode_blob(bytes: &[u8]) -> Vec<u8> {
    let mut out = encode_natural(bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Optional value: `[0]` when absent, `[1] ++ encoded` when present.
#[must_use]
pub fn encode_optional(value: Option<&[u8]>) -> Vec<u8> {
    match value {
        None => vec![0],
        Some(bytes) => {
            let mut out = Vec::with_capacity(1 + bytes.len());
            out.push(1);
            out.extend_from_slice(bytes);
            out
        }
    }
}

/// Fixed-width little-endian encoding of the low `width` bytes.
#[must_use]
pub fn encode_fixed(value: u64, width: usize) -> Vec<u8> {
    value.to_le_bytes()[..width.min(8)].to_vec()
}

// ============================================================================
// Decoding
// ============================================================================

/// Byte cursor over an input slice.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn err(&self, kind: CodecErrorKind) -> CodecError {
        CodecError {
            kind,
            offset: self.pos,
        }
    }

    pub fn byte(&mut self) -> Result<u8, CodecError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| self.err(CodecErrorKind::UnexpectedEnd))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.err(CodecErrorKind::UnexpectedEnd))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Decode a compact natural, rejecting non-minimal encodings.
    pub fn natural(&mut self) -> Result<u64, CodecError> {
        let start = self.pos;
        let non_canonical = CodecError {
            kind: CodecErrorKind::NonCanonical,
            offset: start,
        };
        let first = self.byte()?;
        if first < 0x80 {
            return Ok(u64::from(first));
        }
        if first == 0xff {
            let low = self.bytes(8)?;
            let value = u64::from_le_bytes(low.try_into().expect("8 bytes"));
            if value < 1 << 56 {
                return Err(non_canonical);
            }
            return Ok(value);
        }
        // The prefix byte carries exactly `l` leading one bits.
        let l = first.leading_ones() as usize;
        let low = self.bytes(l)?;
        let mut low_bits = [0u8; 8];
        low_bits[..l].copy_from_slice(low);
        let high = u64::from(first) - (256 - (1u64 << (8 - l)));
        let value = (high << (8 * l)) | u64::from_le_bytes(low_bits);
        if value < 1 << (7 * l) {
            return Err(non_canonical);
        }
        Ok(value)
    }

    /// Decode a compact natural bounded by `limit` (counts, lengths).
    pub fn bounded_natural(&mut self, limit: u64) -> Result<u64, CodecError> {
        let start = self.pos;
        let value = self.natural()?;
        if value > limit {
            return Err(CodecError {
                kind: CodecErrorKind::LengthLimit,
                offset: start,
            });
        }
        Ok(value)
    }

    /// Fixed-width little-endian scalar (1–8 bytes).
    pub fn fixed(&mut self, width: usize) -> Result<u64, CodecError> {
        let bytes = self.bytes(width)?;
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn u16_le(&mut self) -> Result<u16, CodecError> {
        Ok(self.fixed(2)? as u16)
    }

    pub fn u32_le(&mut self) -> Result<u32, CodecError> {
        Ok(self.fixed(4)? as u32)
    }

    pub fn u64_le(&mut self) -> Result<u64, CodecError> {
        self.fixed(8)
    }

    pub fn hash(&mut self) -> Result<Hash, CodecError> {
        let bytes = self.bytes(32)?;
        Ok(bytes.try_into().expect("32 bytes"))
    }

    /// Length-prefixed blob.
    pub fn blob(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.natural()? as usize;
        self.bytes(len)
    }

    /// Optional value: discriminant byte 0 or 1.
    pub fn optional<T>(
        &mut self,
        decode: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<Option<T>, CodecError> {
        let start = self.pos;
        match self.byte()? {
            0 => Ok(None),
            1 => decode(self).map(Some),
            _ => Err(CodecError {
                kind: CodecErrorKind::InvalidDiscriminant,
                offset: start,
            }),
        }
    }

    /// Fail unless the whole input was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(CodecError {
                kind: CodecErrorKind::TrailingBytes,
                offset: self.pos,
            })
        }
    }
}

/// Run `decode` over `data` and reject trailing bytes.
pub fn decode_exact<T>(
    data: &[u8],
    decode: impl FnOnce(&mut Reader<'_>) -> Result<T, CodecError>,
) -> Result<T, CodecError> {
    let mut reader = Reader::new(data);
    let value = decode(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

/// Decode a single compact natural occupying the whole input.
pub fn decode_natural(data: &[u8]) -> Result<u64, CodecError> {
    decode_exact(data, |r| r.natural())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(encode_natural(0), vec![0x00]);
        assert_eq!(encode_natural(127), vec![0x7f]);
        assert_eq!(encode_natural(128), vec![0x80, 0x80]);
        assert_eq!(encode_natural(16383), vec![0xbf, 0xff]);
        assert_eq!(encode_natural(u64::MAX), vec![0xff; 9]);
    }

    #[test]
    fn round_trip_across_length_boundaries() {
        let mut samples = vec![0u64, 1, 127, 128, 255, 256, 16383, 16384];
        for shift in [21, 28, 35, 42, 49, 56, 63] {
            let boundary = 1u64 << shift;
            samples.extend([boundary - 1, boundary, boundary + 1]);
        }
        samples.push(u64::MAX);
        for value in samples {
            let encoded = encode_natural(value);
            assert_eq!(decode_natural(&encoded).unwrap(), value, "value {value}");
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut encoded = encode_natural(5);
        encoded.push(0);
        assert_eq!(
            decode_natural(&encoded).unwrap_err().kind,
            CodecErrorKind::TrailingBytes
        );
    }

    #[test]
    fn non_canonical_rejected() {
        // 0x80 0x00 would decode to 0, which has a shorter encoding.
        assert_eq!(
            decode_natural(&[0x80, 0x00]).unwrap_err().kind,
            CodecErrorKind::NonCanonical
        );
        // 0xFF prefix with a value below 2^56.
        let mut nine = vec![0xff];
        nine.extend_from_slice(&1u64.to_le_bytes());
        assert_eq!(
            decode_natural(&nine).unwrap_err().kind,
            CodecErrorKind::NonCanonical
        );
    }

    #[test]
    fn truncated_input_reports_offset() {
        let err = decode_natural(&[0xbf]).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::UnexpectedEnd);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn blob_and_optional() {
        let encoded = encode_blob(b"abc");
        let decoded = decode_exact(&encoded, |r| Ok(r.blob()?.to_vec())).unwrap();
        assert_eq!(decoded, b"abc");

        assert_eq!(encode_optional(None), vec![0]);
        let some = encode_optional(Some(b"xy"));
        assert_eq!(some, vec![1, b'x', b'y']);
        let decoded = decode_exact(&some, |r| r.optional(|r| Ok(r.bytes(2)?.to_vec()))).unwrap();
        assert_eq!(decoded.as_deref(), Some(b"xy".as_slice()));
    }
}
