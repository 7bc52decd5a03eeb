//! Clock abstraction.
//!
//! Everything that needs "now" asks a [`Clock`], so tests can pin time and
//! an application can run on an adjusted clock without touching the
//! system time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeDelta};
use parking_lot::Mutex;

use crate::settings::Settings;

/// Settings key holding the persisted clock offset, in ticks (100 ns).
pub const CLOCK_OFFSET_KEY: &str = "Clock.Offset";

/// Source of the current (local wall-clock) time.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Wait for a certain amount of time.
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Raw time reading underneath an [`OffsetClock`].
pub trait TimeSource: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that can be set without touching the system time.
///
/// Setting the time stores the offset from the underlying source; every
/// later reading is shifted by it. With a settings store attached, the
/// offset is persisted and picked up by the next clock built over the
/// same settings.
pub struct OffsetClock {
    source: Arc<dyn TimeSource>,
    settings: Option<Arc<dyn Settings>>,
    offset: Mutex<Option<TimeDelta>>,
}

impl OffsetClock {
    /// Clock over local system time.
    pub fn new() -> Self {
        Self::with_source(Arc::new(SystemClock))
    }

    pub fn with_source(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            settings: None,
            offset: Mutex::new(None),
        }
    }

    /// Persist the offset through `settings`.
    pub fn with_settings(mut self, settings: Arc<dyn Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Current offset from the underlying source.
    pub fn offset(&self) -> TimeDelta {
        let mut offset = self.offset.lock();
        *offset.get_or_insert_with(|| self.load_offset())
    }

    /// Make the clock read `at` from now on.
    pub fn set_now(&self, at: NaiveDateTime) {
        let offset = at - self.source.now();
        *self.offset.lock() = Some(offset);

        if let Some(settings) = &self.settings {
            settings.set_key(CLOCK_OFFSET_KEY, &to_ticks(offset).to_string());
        }
    }

    fn load_offset(&self) -> TimeDelta {
        let Some(stored) = self.settings.as_ref().and_then(|s| s.get_key(CLOCK_OFFSET_KEY)) else {
            return TimeDelta::zero();
        };
        match stored.parse::<i64>() {
            Ok(ticks) => from_ticks(ticks),
            Err(e) => {
                tracing::warn!(value = %stored, error = %e, "ignoring unreadable clock offset");
                TimeDelta::zero()
            }
        }
    }
}

impl Default for OffsetClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for OffsetClock {
    fn now(&self) -> NaiveDateTime {
        let base = self.source.now();
        base.checked_add_signed(self.offset()).unwrap_or(base)
    }
}

fn to_ticks(delta: TimeDelta) -> i64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos / 100,
        None => delta.num_microseconds().map_or(i64::MAX, |micros| micros.saturating_mul(10)),
    }
}

fn from_ticks(ticks: i64) -> TimeDelta {
    TimeDelta::microseconds(ticks / 10) + TimeDelta::nanoseconds((ticks % 10) * 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;
    use chrono::NaiveDate;

    /// Time source the test moves by hand.
    struct ManualTime(Mutex<NaiveDateTime>);

    impl ManualTime {
        fn new(at: NaiveDateTime) -> Arc<Self> {
            Arc::new(Self(Mutex::new(at)))
        }

        fn set(&self, at: NaiveDateTime) {
            *self.0.lock() = at;
        }

        fn advance(&self, by: TimeDelta) {
            *self.0.lock() += by;
        }
    }

    impl TimeSource for ManualTime {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock()
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn clock_with_settings(source: &Arc<ManualTime>, settings: &Arc<MemorySettings>) -> OffsetClock {
        OffsetClock::with_source(source.clone()).with_settings(settings.clone())
    }

    #[test]
    fn test_simple_time() {
        let expected = at(2018, 3, 24, 12, 56, 30);
        let source = ManualTime::new(expected);
        let clock = clock_with_settings(&source, &Arc::new(MemorySettings::new()));

        assert_eq!(clock.now(), expected);
    }

    #[test]
    fn test_set_time() {
        let source = ManualTime::new(at(2017, 4, 1, 19, 16, 3));
        let clock = clock_with_settings(&source, &Arc::new(MemorySettings::new()));

        let expected = at(2018, 3, 24, 12, 56, 30);
        clock.set_now(expected);

        assert_eq!(clock.now(), expected);
    }

    #[test]
    fn test_set_time_without_settings() {
        let source = ManualTime::new(at(2017, 4, 1, 19, 16, 3));
        let clock = OffsetClock::with_source(source.clone());

        let expected = at(2018, 3, 24, 12, 56, 30);
        clock.set_now(expected);

        assert_eq!(clock.now(), expected);
    }

    #[test]
    fn test_set_time_check_later() {
        let source = ManualTime::new(at(2017, 4, 1, 19, 16, 3));
        let clock = clock_with_settings(&source, &Arc::new(MemorySettings::new()));

        let expected = at(2018, 3, 24, 12, 56, 30);
        let offset = TimeDelta::minutes(225);
        clock.set_now(expected - offset);
        source.advance(offset);

        assert_eq!(clock.now(), expected);
    }

    #[test]
    fn test_offset_survives_new_clock() {
        let source = ManualTime::new(at(2017, 4, 1, 19, 16, 3));
        let settings = Arc::new(MemorySettings::new());
        let clock = clock_with_settings(&source, &settings);

        let expected = at(2018, 3, 24, 12, 56, 30);
        let offset = TimeDelta::minutes(225);
        clock.set_now(expected - offset);
        source.advance(offset);

        let next_run = clock_with_settings(&source, &settings);
        assert_eq!(next_run.now(), expected);
    }

    #[test]
    fn test_unreadable_offset_is_ignored() {
        let now = at(2018, 3, 24, 12, 56, 30);
        let source = ManualTime::new(now);
        let settings = Arc::new(MemorySettings::new());
        settings.set_key(CLOCK_OFFSET_KEY, "soon");

        let clock = clock_with_settings(&source, &settings);
        assert_eq!(clock.now(), now);

        source.set(at(2020, 1, 1, 0, 0, 0));
        assert_eq!(clock.now(), at(2020, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_tick_conversion() {
        let delta = TimeDelta::seconds(3) + TimeDelta::nanoseconds(700);
        assert_eq!(to_ticks(delta), 30_000_007);
        assert_eq!(from_ticks(30_000_007), delta);
        assert_eq!(from_ticks(-30_000_007), -delta);
    }

    #[tokio::test]
    async fn test_system_clock_advances() {
        let clock = SystemClock;
        let before = Clock::now(&clock);
        clock.delay(Duration::from_millis(5)).await;
        let after = Clock::now(&clock);

        assert!(after > before);
    }
}
