//! Human-readable byte sizes
//!
//! Body-parser limits are exchanged in the `"100kb"` form. [`ByteSize`] keeps
//! the byte count and serializes back to the shortest exact unit.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// A size in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn b(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn kb(n: u64) -> Self {
        Self(n.saturating_mul(KB))
    }

    pub const fn mb(n: u64) -> Self {
        Self(n.saturating_mul(MB))
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidByteSize {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim().to_ascii_lowercase();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        if number.is_empty() {
            return Err(invalid("missing number"));
        }
        let number: f64 = number.parse().map_err(|_| invalid("malformed number"))?;

        let multiplier = match unit.trim() {
            "" | "b" => 1,
            "kb" => KB,
            "mb" => MB,
            "gb" => GB,
            "tb" => TB,
            _ => return Err(invalid("unknown unit (expected b, kb, mb, gb or tb)")),
        };

        let bytes = (number * multiplier as f64).floor();
        if !bytes.is_finite() || bytes > u64::MAX as f64 {
            return Err(invalid("size out of range"));
        }
        Ok(Self(bytes as u64))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        for (unit, size) in [("tb", TB), ("gb", GB), ("mb", MB), ("kb", KB)] {
            if bytes >= size && bytes % size == 0 {
                return write!(f, "{}{unit}", bytes / size);
            }
        }
        write!(f, "{bytes}b")
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bytes(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
