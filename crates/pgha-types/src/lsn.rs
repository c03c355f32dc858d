use std::fmt::{self, Display};
use std::str::FromStr;

/// An opaque, totally ordered position in the database's change log.
///
/// On the wire and on disk this is the string form `"X/Y"` (two hex
/// components, as reported by the database's own LSN functions); internally
/// it is kept as a single `u64` so standbys can be compared and ordered
/// without re-parsing on every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lsn(u64);

impl Lsn {
    pub const ZERO: Lsn = Lsn(0);

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Distance between two LSNs, saturating at zero if `self` is behind
    /// `other` (used for catch-up tolerance checks).
    pub fn distance_from(self, other: Lsn) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid LSN string {0:?}: expected \"X/Y\" hex pair")]
pub struct LsnParseError(String);

impl FromStr for Lsn {
    type Err = LsnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hi, lo) = s
            .split_once('/')
            .ok_or_else(|| LsnParseError(s.to_string()))?;
        let hi = u32::from_str_radix(hi, 16).map_err(|_| LsnParseError(s.to_string()))?;
        let lo = u32::from_str_radix(lo, 16).map_err(|_| LsnParseError(s.to_string()))?;
        Ok(Lsn(((hi as u64) << 32) | lo as u64))
    }
}

impl Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}/{:X}", self.0 >> 32, self.0 & 0xFFFF_FFFF)
    }
}

impl TryFrom<String> for Lsn {
    type Error = LsnParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lsn> for String {
    fn from(value: Lsn) -> Self {
        value.to_string()
    }
}

/// An integer identifying a fork of the change-log history.
///
/// Bumped at every promotion; used to detect that a demoted primary must
/// rewind before resuming as a standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TimelineId(u32);

impl TimelineId {
    pub const INITIAL: TimelineId = TimelineId(1);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
