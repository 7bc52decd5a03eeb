//! Session identifiers and their on-disk encoding.
//!
//! A session is identified by the moment it was created, stored as a tick
//! count (100 ns units since 0001-01-01T00:00:00). Ticks are exact in both
//! directions, so the identifier survives the trip through a file name:
//!
//! ```text
//! 2018-03-24 13:39:50  ->  08d5918cb7545700  ->  Logs/08d5918cb7545700.txt
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDateTime};

use crate::error::{CoreError, CoreResult};

/// Ticks per second (one tick is 100 nanoseconds).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01T00:00:00 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Suffix appended to every session file name.
pub const LOG_FILE_SUFFIX: &str = ".txt";

/// Width of the hexadecimal token.
const HEX_WIDTH: usize = 16;

const NANOS_PER_TICK: u32 = 100;

/// Identifier of one logging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(i64);

impl SessionId {
    /// Create a SessionId from a raw, non-negative tick count.
    pub fn from_ticks(ticks: i64) -> CoreResult<Self> {
        if ticks < 0 {
            return Err(CoreError::TimestampOutOfRange(format!(
                "negative tick count {}",
                ticks
            )));
        }
        Ok(Self(ticks))
    }

    /// Capture a SessionId from a wall-clock reading.
    ///
    /// Precision below one tick is truncated.
    pub fn from_datetime(at: NaiveDateTime) -> CoreResult<Self> {
        let utc = at.and_utc();
        // Leap seconds report nanos >= 1e9; fold them into the last tick.
        let nanos = utc.timestamp_subsec_nanos().min(999_999_999);
        let ticks = utc
            .timestamp()
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|t| t.checked_add(i64::from(nanos / NANOS_PER_TICK)))
            .and_then(|t| t.checked_add(UNIX_EPOCH_TICKS))
            .ok_or_else(|| CoreError::TimestampOutOfRange(at.to_string()))?;
        Self::from_ticks(ticks)
    }

    /// Raw tick count.
    pub fn ticks(&self) -> i64 {
        self.0
    }

    /// The timestamp this identifier stands for.
    pub fn to_datetime(&self) -> NaiveDateTime {
        let since_epoch = self.0 - UNIX_EPOCH_TICKS;
        let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) as u32 * NANOS_PER_TICK;
        // Every non-negative tick count lies well inside chrono's range.
        DateTime::from_timestamp(secs, nanos)
            .map(|dt| dt.naive_utc())
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Fixed-width lowercase hexadecimal token. Sorts like the timestamp.
    pub fn to_hex(&self) -> String {
        format!("{:0width$x}", self.0, width = HEX_WIDTH)
    }

    /// Parse a token produced by [`SessionId::to_hex`].
    pub fn from_hex(token: &str) -> CoreResult<Self> {
        let well_formed = token.len() == HEX_WIDTH
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(CoreError::MalformedSessionName(token.to_string()));
        }
        let ticks = i64::from_str_radix(token, 16)
            .map_err(|_| CoreError::MalformedSessionName(token.to_string()))?;
        Self::from_ticks(ticks).map_err(|_| CoreError::MalformedSessionName(token.to_string()))
    }

    /// Name of the file holding this session's lines.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.to_hex(), LOG_FILE_SUFFIX)
    }

    /// Parse a file name produced by [`SessionId::file_name`].
    pub fn from_file_name(name: &str) -> CoreResult<Self> {
        let token = name
            .strip_suffix(LOG_FILE_SUFFIX)
            .ok_or_else(|| CoreError::MalformedSessionName(name.to_string()))?;
        Self::from_hex(token).map_err(|_| CoreError::MalformedSessionName(name.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
