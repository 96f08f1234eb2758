//! Wall-clock source
//!
//! The control loop asks a [`TimeSource`] once per iteration whether a new
//! second started. Network time synchronisation itself belongs to the host
//! (NTP daemon); [`SystemClock`] only waits until the host clock looks synced,
//! then fixes its time zone once via [`SystemClock::initialize`].

use crate::ClockTime;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use tracing::{info, warn};

/// Earliest year a synced host clock can report
const MIN_SYNCED_YEAR: i32 = 2020;

/// Source of the current local time
pub trait TimeSource {
    /// Poll the clock; true exactly once per newly started second.
    fn process(&mut self) -> bool;

    /// The current local time, all zeros while not yet synced
    fn now(&self) -> ClockTime;

    fn hour(&self) -> u8 {
        self.now().hour
    }

    fn minute(&self) -> u8 {
        self.now().minute
    }

    fn second(&self) -> u8 {
        self.now().second
    }
}

/// Host clock with edge-detected seconds
pub struct SystemClock {
    utc_offset_minutes: i32,
    /// `None` until the first synced reading
    zone: Option<FixedOffset>,
    last_second: Option<i64>,
    source: fn() -> DateTime<Utc>,
}

impl SystemClock {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self::with_source(utc_offset_minutes, Utc::now)
    }

    /// Clock reading time from `source` instead of the host clock.
    pub fn with_source(utc_offset_minutes: i32, source: fn() -> DateTime<Utc>) -> Self {
        Self {
            utc_offset_minutes,
            zone: None,
            last_second: None,
            source,
        }
    }

    pub fn zone(&self) -> Option<FixedOffset> {
        self.zone
    }

    /// Fix the local time zone. Called once, on the first synced reading.
    pub fn initialize(&mut self) {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
            warn!(
                offset_minutes = self.utc_offset_minutes,
                "UTC offset out of range, using UTC"
            );
            Utc.fix()
        });
        self.zone = Some(offset);
        let local = (self.source)().with_timezone(&offset);
        info!(time = %local.format("%Y-%m-%d %H:%M:%S %:z"), "time synced");
    }
}

impl TimeSource for SystemClock {
    fn process(&mut self) -> bool {
        let now = (self.source)();
        if now.year() < MIN_SYNCED_YEAR {
            return false;
        }
        if self.zone.is_none() {
            self.initialize();
        }
        let second = now.timestamp();
        if self.last_second == Some(second) {
            return false;
        }
        self.last_second = Some(second);
        true
    }

    fn now(&self) -> ClockTime {
        match self.zone {
            None => ClockTime::default(),
            Some(offset) => {
                let local = (self.source)().with_timezone(&offset);
                ClockTime::new(local.hour() as u8, local.minute() as u8, local.second() as u8)
            }
        }
    }
}

/// A clock frozen at one time; reports a single tick.
///
/// Used to preview what the clock shows at a given time of day.
pub struct FixedTime {
    time: ClockTime,
    ticked: bool,
}

impl FixedTime {
    pub fn new(time: ClockTime) -> Self {
        Self {
            time,
            ticked: false,
        }
    }
}

impl TimeSource for FixedTime {
    fn process(&mut self) -> bool {
        !std::mem::replace(&mut self.ticked, true)
    }

    fn now(&self) -> ClockTime {
        self.time
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(text: &str) -> Option<ClockTime> {
    let text = text.trim();
    let time = chrono::NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()?;
    Some(ClockTime::new(
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unsynced() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 5).unwrap()
    }

    fn synced() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 5, 56, 30).unwrap()
    }

    #[test]
    fn test_unsynced_clock_reports_nothing() {
        let mut clock = SystemClock::with_source(60, unsynced);
        assert!(!clock.process());
        assert_eq!(clock.zone(), None);
        assert_eq!(clock.now(), ClockTime::default());
        assert_eq!(clock.hour(), 0);
    }

    #[test]
    fn test_synced_clock_initializes_zone_once() {
        let mut clock = SystemClock::with_source(60, synced);
        assert!(clock.process());
        assert_eq!(clock.zone(), FixedOffset::east_opt(3600));
        // Same second again: no new tick
        assert!(!clock.process());

        assert_eq!(clock.now(), ClockTime::new(6, 56, 30));
        assert_eq!(clock.minute(), 56);
        assert_eq!(clock.second(), 30);
    }

    #[test]
    fn test_fixed_time_ticks_once() {
        let mut clock = FixedTime::new(ClockTime::new(6, 51, 0));
        assert!(clock.process());
        assert!(!clock.process());
        assert_eq!(clock.hour(), 6);
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("06:56"), Some(ClockTime::new(6, 56, 0)));
        assert_eq!(parse_clock_time("23:59:58"), Some(ClockTime::new(23, 59, 58)));
        assert_eq!(parse_clock_time("noon"), None);
        assert_eq!(parse_clock_time("24:00"), None);
    }
}
