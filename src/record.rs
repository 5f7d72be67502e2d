//! Fixed-size binary record.

use std::cmp::Ordering;
use std::fmt;

/// Record size in bytes: big-endian `i64` id followed by big-endian `f64` key.
pub const RECORD_SIZE: usize = 16;

/// Sortable record. Records are ordered by key only, the id is an opaque payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    id: i64,
    key: f64,
}

impl Record {
    pub fn new(id: i64, key: f64) -> Self {
        Record { id, key }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn key(&self) -> f64 {
        self.key
    }

    /// Compares two records by key. Uses IEEE-754 total order so that NaN keys
    /// still produce a consistent ordering.
    pub fn cmp_key(&self, other: &Record) -> Ordering {
        self.key.total_cmp(&other.key)
    }

    /// Decodes a record from the first [`RECORD_SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than [`RECORD_SIZE`].
    pub fn decode(bytes: &[u8]) -> Self {
        let mut id = [0u8; 8];
        let mut key = [0u8; 8];
        id.copy_from_slice(&bytes[0..8]);
        key.copy_from_slice(&bytes[8..RECORD_SIZE]);

        return Record {
            id: i64::from_be_bytes(id),
            key: f64::from_be_bytes(key),
        };
    }

    /// Encodes the record into its on-disk representation.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..8].copy_from_slice(&self.id.to_be_bytes());
        bytes[8..RECORD_SIZE].copy_from_slice(&self.key.to_be_bytes());
        bytes
    }
}

/// Formats a record as `"<id> <key>"`. Keys use plain decimal notation within
/// `[1e-3, 1e7)` and `d.dddE<exp>` notation outside of it, always with at least
/// one fractional digit.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.id)?;
        fmt_key(self.key, f)
    }
}

fn fmt_key(key: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if key.is_nan() {
        return f.write_str("NaN");
    }
    if key.is_infinite() {
        return f.write_str(if key > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if key == 0.0 {
        return f.write_str(if key.is_sign_negative() { "-0.0" } else { "0.0" });
    }

    if (1e-3..1e7).contains(&key.abs()) {
        let plain = key.to_string();
        return if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{}.0", plain)
        };
    }

    let scientific = format!("{:e}", key);
    match scientific.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => write!(f, "{}E{}", mantissa, exp),
        Some((mantissa, exp)) => write!(f, "{}.0E{}", mantissa, exp),
        None => f.write_str(&scientific),
    }
}
