//! Display converters.
//!
//! Small value-to-display mappings for presentation code: yes/no values
//! keyed on whether a value is "set", and text renderings of timestamps
//! and durations with a `---` placeholder for missing values.

use std::fmt::Write;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{CoreError, CoreResult};

/// Placeholder rendered for a missing value.
pub const EMPTY: &str = "---";

/// Timestamp layout used when no format is given.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A loosely typed value handed to a converter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
    /// No value at all
    Null,
    /// A value of some other kind; only its presence matters
    Other,
}

impl Value {
    /// Whether this is the default ("unset") value for its kind.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Timestamp(at) => *at == NaiveDateTime::default(),
            Value::Text(s) => s.is_empty(),
            Value::Null => true,
            Value::Other => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(at: NaiveDateTime) -> Self {
        Value::Timestamp(at)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Maps "is this value unset?" onto one of two display values.
///
/// A default value converts to `yes`, anything else to `no`. Passing
/// `"invert"` or `"false"` as the parameter swaps the two.
#[derive(Debug, Clone)]
pub struct DefaultConverter<T> {
    yes: T,
    no: T,
}

impl<T: Clone> DefaultConverter<T> {
    pub fn new(yes: T, no: T) -> Self {
        Self { yes, no }
    }

    pub fn convert(&self, value: &Value, parameter: Option<&str>) -> T {
        let invert = matches!(parameter, Some("invert") | Some("false"));
        if value.is_default() ^ invert {
            self.yes.clone()
        } else {
            self.no.clone()
        }
    }
}

/// Renders timestamps as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormatConverter;

impl DateFormatConverter {
    /// Render `value` with a strftime `format`, or [`DEFAULT_DATE_FORMAT`].
    pub fn convert(&self, value: Option<NaiveDateTime>, format: Option<&str>) -> CoreResult<String> {
        let Some(at) = value else {
            return Ok(EMPTY.to_string());
        };
        let format = format.unwrap_or(DEFAULT_DATE_FORMAT);

        let mut out = String::new();
        write!(out, "{}", at.format(format))
            .map_err(|_| CoreError::InvalidFormat(format.to_string()))?;
        Ok(out)
    }
}

/// Renders durations as text.
///
/// Without a format the constant layout `[-][d.]hh:mm:ss[.fffffff]` is
/// used: days only when there are any, the fraction only when non-zero.
/// A custom format is built from the tokens below; any other letter is
/// rejected, every other character is copied as-is, and `\` escapes the
/// next character. Custom formats render the magnitude without a sign.
///
/// | token       | meaning                              |
/// |-------------|--------------------------------------|
/// | `d`..       | whole days, zero-padded to run width |
/// | `h`, `hh`   | hours of the day                     |
/// | `m`, `mm`   | minutes of the hour                  |
/// | `s`, `ss`   | seconds of the minute                |
/// | `f`..`fffffff` | fraction digits, truncated        |
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationFormatConverter;

impl DurationFormatConverter {
    pub fn convert(&self, value: Option<TimeDelta>, format: Option<&str>) -> CoreResult<String> {
        let Some(delta) = value else {
            return Ok(EMPTY.to_string());
        };
        let parts = Parts::of(delta);
        match format {
            None => Ok(parts.constant()),
            Some(format) => parts.custom(format),
        }
    }
}

/// A duration split into display fields.
struct Parts {
    negative: bool,
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    /// Sub-second part in ticks (100 ns)
    fraction: u64,
}

impl Parts {
    fn of(delta: TimeDelta) -> Self {
        let negative = delta < TimeDelta::zero();
        let abs = delta.abs();
        let secs = abs.num_seconds().unsigned_abs();
        let fraction = (abs - TimeDelta::seconds(abs.num_seconds())).num_nanoseconds().unwrap_or(0) / 100;

        Self {
            negative,
            days: secs / 86_400,
            hours: secs / 3_600 % 24,
            minutes: secs / 60 % 60,
            seconds: secs % 60,
            fraction: fraction.unsigned_abs(),
        }
    }

    fn constant(&self) -> String {
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        if self.days > 0 {
            let _ = write!(out, "{}.", self.days);
        }
        let _ = write!(out, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds);
        if self.fraction > 0 {
            let _ = write!(out, ".{:07}", self.fraction);
        }
        out
    }

    fn custom(&self, format: &str) -> CoreResult<String> {
        let invalid = || CoreError::InvalidFormat(format.to_string());
        let mut out = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\\' {
                out.push(chars.next().ok_or_else(invalid)?);
                continue;
            }
            if !c.is_ascii_alphabetic() {
                out.push(c);
                continue;
            }

            let mut width = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                width += 1;
            }
            match (c, width) {
                ('d', 1..=8) => {
                    let _ = write!(out, "{:0width$}", self.days, width = width);
                }
                ('h', 1..=2) => {
                    let _ = write!(out, "{:0width$}", self.hours, width = width);
                }
                ('m', 1..=2) => {
                    let _ = write!(out, "{:0width$}", self.minutes, width = width);
                }
                ('s', 1..=2) => {
                    let _ = write!(out, "{:0width$}", self.seconds, width = width);
                }
                ('f', 1..=7) => {
                    let digits = self.fraction / 10u64.pow(7 - width as u32);
                    let _ = write!(out, "{:0width$}", digits, width = width);
                }
                _ => return Err(invalid()),
            }
        }
        Ok(out)
    }
}
