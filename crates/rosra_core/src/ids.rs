//! crates/rosra_core/src/ids.rs
//! Category/report tokens and canonical output IDs.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entities::StreamKind;

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    NonAscii,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::NonAscii => f.write_str("id must be ASCII without NUL"),
            IdError::TooLong => f.write_str("id too long"),
            IdError::BadShape => f.write_str("id has an invalid shape"),
        }
    }
}

const MAX_ID_LEN: usize = 256;
const HEX64_LEN: usize = 64;
const TOKEN_MAX_LEN: usize = 64;

#[inline]
fn is_ascii_no_nul(s: &str) -> bool {
    !s.as_bytes().iter().any(|&b| b == 0 || b > 0x7F)
}

/// Lowercase hex, exactly 64 chars.
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Token for CategoryId/ReportId: ^[A-Za-z0-9_.:-]{1,64}$
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let len = s.len();
    if len == 0 || len > TOKEN_MAX_LEN || !is_ascii_no_nul(s) {
        return false;
    }
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
}

macro_rules! checked_string_newtype {
    ($(#[$m:meta])* $name:ident, $check:expr) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if !is_ascii_no_nul(s) { return Err(IdError::NonAscii); }
                if s.len() > MAX_ID_LEN { return Err(IdError::TooLong); }
                let check: fn(&str) -> bool = $check;
                if !check(s) { return Err(IdError::BadShape); }
                Ok($name(s.to_owned()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String { v.0 }
        }
    };
}

// === Tokens ===

checked_string_newtype!(
    /// Stable category identifier, unique within one stream's collection.
    CategoryId,
    is_valid_token
);

checked_string_newtype!(
    /// Saved report identifier (file stem for the file gateway).
    ReportId,
    is_valid_token
);

checked_string_newtype!(
    /// 64-hex lowercase SHA-256 digest.
    Sha256,
    is_valid_sha256
);

impl CategoryId {
    /// Compose `<prefix>-<seq>` from an arbitrary prefix.
    pub fn from_seq(prefix: &str, seq: u64) -> Result<Self, IdError> {
        format!("{prefix}-{seq}").parse()
    }

    /// Store-assigned id for a stream. Stream prefixes are fixed ASCII tokens,
    /// so the result is always valid.
    pub fn for_stream(kind: StreamKind, seq: u64) -> Self {
        let s = format!("{}-{seq}", kind.id_prefix());
        debug_assert!(is_valid_token(&s));
        CategoryId(s)
    }
}

// === Prefixed output IDs: RES, RUN ===

checked_string_newtype!(
    /// "RES:" + 64-hex lowercase
    ResultId,
    is_res_shape
);

checked_string_newtype!(
    /// "RUN:" + <RFC3339 UTC 'YYYY-MM-DDTHH:MM:SSZ'> + "-" + 64-hex lowercase
    RunId,
    is_run_shape
);

fn is_res_shape(s: &str) -> bool {
    s.len() == 4 + HEX64_LEN && s.starts_with("RES:") && is_valid_sha256(&s[4..])
}

/// Strict RFC3339 "YYYY-MM-DDTHH:MM:SSZ"
fn is_rfc3339_utc_20(ts: &str) -> bool {
    let b = ts.as_bytes();
    if b.len() != 20 { return false; }
    let digits = |r: core::ops::Range<usize>| b[r].iter().all(|c| c.is_ascii_digit());
    digits(0..4)
        && b[4] == b'-'
        && digits(5..7)
        && b[7] == b'-'
        && digits(8..10)
        && b[10] == b'T'
        && digits(11..13)
        && b[13] == b':'
        && digits(14..16)
        && b[16] == b':'
        && digits(17..19)
        && b[19] == b'Z'
}

fn is_run_shape(s: &str) -> bool {
    if s.len() != 4 + 20 + 1 + HEX64_LEN || !s.starts_with("RUN:") {
        return false;
    }
    is_rfc3339_utc_20(&s[4..24]) && s.as_bytes()[24] == b'-' && is_valid_sha256(&s[25..])
}

impl ResultId {
    #[inline] pub fn as_hex(&self) -> &str { &self.0[4..] }
}

impl RunId {
    /// Embedded timestamp (RFC3339 UTC).
    #[inline]
    pub fn timestamp_utc(&self) -> &str { &self.0[4..24] }
}
