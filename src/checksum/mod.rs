//! Row-level checksum engine
//!
//! Recomputes the CRC32 row checksum the source database embeds in each
//! change event and compares it with the embedded value.
//!
//! # Pipeline
//!
//! For each column descriptor, in schema order:
//!
//! 1. normalize the decoded value (union unwrap, enum/set ordinals)
//! 2. encode it into the canonical byte form for its type tag
//! 3. fold the bytes into the running CRC32
//!
//! # Invariants
//!
//! - Column order is checksum-significant and never reordered
//! - Every failure aborts the record; there is no partial result
//! - No I/O and no shared mutable state

mod accumulator;
mod config;
mod encoder;
mod errors;
mod normalize;
mod verifier;

pub use accumulator::ChecksumAccumulator;
pub use config::{ConfigError, TimestampZone, VerifierConfig, CHECKSUM_COLUMN};
pub use encoder::{
    append_length_value, binary_literal_to_u64, encode_value, encoder_for, parse_decimal_u64,
    EncodeFault, EncodeFn,
};
pub use errors::{ChecksumError, ChecksumResult, ErrorKind};
pub use normalize::{normalize, NormalizedValue};
pub use verifier::{verify, RowVerifier, Verification};
