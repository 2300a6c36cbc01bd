//! Registry wire-format envelope
//!
//! Change-event values are framed as:
//!
//! ```text
//! +-------+----------------------+-----------------+
//! | 0x00  | schema id (u32, BE)  | encoded payload |
//! +-------+----------------------+-----------------+
//! ```
//!
//! An empty value is a delete event and carries no row to verify.
//!
//! Library-only: the `rowcrc` binary reads rows as Avro JSON and never
//! sees framed bytes.

use thiserror::Error;

/// Leading marker byte of every framed value
pub const MAGIC_BYTE: u8 = 0x00;

/// Marker byte plus schema id
pub const HEADER_LEN: usize = 5;

/// Envelope errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Framed value is {0} bytes, shorter than the 5-byte header")]
    TooShort(usize),

    #[error("Framed value starts with 0x{0:02x}, expected magic byte 0x00")]
    BadMagic(u8),
}

/// Framed value with its header split off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Registry schema identifier
    pub schema_id: u32,
    /// Encoded row payload
    pub payload: &'a [u8],
}

/// What a raw change-event value holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValue<'a> {
    /// Empty value: the event deletes a row and carries nothing to verify
    Delete,
    /// Framed row payload
    Row(Envelope<'a>),
}

impl<'a> RecordValue<'a> {
    /// Classifies a raw value, splitting the envelope of non-empty ones.
    pub fn classify(data: &'a [u8]) -> Result<Self, EnvelopeError> {
        if data.is_empty() {
            return Ok(RecordValue::Delete);
        }
        split_envelope(data).map(RecordValue::Row)
    }
}

/// Splits the header off a framed value.
pub fn split_envelope(data: &[u8]) -> Result<Envelope<'_>, EnvelopeError> {
    if data.len() < HEADER_LEN {
        return Err(EnvelopeError::TooShort(data.len()));
    }
    if data[0] != MAGIC_BYTE {
        return Err(EnvelopeError::BadMagic(data[0]));
    }
    let schema_id = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
    Ok(Envelope {
        schema_id,
        payload: &data[HEADER_LEN..],
    })
}
