//! Running row checksum
//!
//! CRC32 (IEEE polynomial) folded column by column. The running value
//! after column `i` seeds column `i + 1`, so the result equals the CRC32
//! of all canonical column bytes concatenated in descriptor order.
//!
//! One accumulator belongs to one row computation; it is never shared.

use crc32fast::Hasher;

use super::config::TimestampZone;
use super::encoder::encode_value;
use super::errors::ChecksumResult;
use super::normalize::normalize;
use crate::row::DecodedValue;
use crate::schema::ColumnDescriptor;

/// Running checksum plus a reusable per-column encoding buffer
pub struct ChecksumAccumulator {
    hasher: Hasher,
    buf: Vec<u8>,
    columns: usize,
}

impl ChecksumAccumulator {
    /// Create an accumulator seeded with zero
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
            buf: Vec::with_capacity(64),
            columns: 0,
        }
    }

    /// Normalizes, encodes and folds one column.
    pub fn update_column(
        &mut self,
        descriptor: &ColumnDescriptor,
        raw: Option<&DecodedValue>,
        zone: &TimestampZone,
    ) -> ChecksumResult<()> {
        let value = normalize(raw, descriptor)?;

        self.buf.clear();
        encode_value(&mut self.buf, &value, descriptor.tag, zone)
            .map_err(|fault| fault.into_error(descriptor, raw))?;

        self.hasher.update(&self.buf);
        self.columns += 1;
        Ok(())
    }

    /// Folds already-encoded bytes
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Bytes produced by the most recent column
    pub fn last_column_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of columns folded so far
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Current checksum without consuming the accumulator
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Final checksum
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for ChecksumAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
