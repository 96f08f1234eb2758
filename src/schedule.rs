//! # Day/Night Schedule
//!
//! Maps the time of day onto a [`DisplayState`], a progress fraction and a
//! backlight level. The evaluation is a pure function of its inputs; it is
//! recomputed on every tick and never remembers earlier results.
//!
//! ## Timeline
//! With `awake < sleep` (both minute-of-day), a day looks like this:
//!
//! ```text
//! 00:00 ... awake-2T ... awake-T ... awake ......... sleep ... 23:59
//!  Sleeping  | Sleeping   | WakingUp  | Awake          | Sleeping
//!  progress 0| dimming    | ramp      | progress 1     | progress 0
//! ```
//!
//! where `T` is the configured awake transition. The two windows before
//! `awake` share the same length and each report progress rising from 0 to 1.

use crate::{ClockTime, DisplayState};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading schedule values
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// Not a `HH:MM` time of day
    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),
}

/// Parse a `HH:MM` time of day into minutes after midnight.
pub fn parse_hhmm(text: &str) -> Result<u16, ScheduleError> {
    let time = chrono::NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(text.to_string()))?;
    Ok(time.hour() as u16 * 60 + time.minute() as u16)
}

/// Format minutes after midnight as `HH:MM`.
pub fn format_hhmm(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Serde adapter storing minute-of-day values as `"HH:MM"` strings
mod hhmm {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(minutes: &u16, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_hhmm(&text).map_err(D::Error::custom)
    }
}

/// The three user-editable schedule values, all in minutes.
///
/// Copied as a whole out of the shared holder once per evaluation so a
/// concurrent update is never seen half-applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Bedtime, minute of day
    #[serde(rename = "sleep", with = "hhmm")]
    pub sleep_time: u16,
    /// Wake-up time, minute of day
    #[serde(rename = "awake", with = "hhmm")]
    pub awake_time: u16,
    /// Length of the wake-up ramp in minutes
    pub awake_transition_minutes: u16,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sleep_time: 19 * 60,
            awake_time: 7 * 60,
            awake_transition_minutes: 5,
        }
    }
}

impl ScheduleConfig {
    /// True when wake-up comes before bedtime within one day, which the
    /// evaluation assumes.
    pub fn is_well_ordered(&self) -> bool {
        self.awake_time < self.sleep_time
    }
}

/// Backlight levels and the bright windows around the awake period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessLevels {
    /// Night and quiet daytime
    pub low: u8,
    /// Dimming window before the wake-up ramp
    pub pre_wake: u8,
    /// Wake-up ramp
    pub waking: u8,
    /// Right after wake-up and right before bedtime
    pub high: u8,
    /// Minutes after wake-up that stay bright
    pub bright_after_awake_minutes: u16,
    /// Minutes before bedtime that are bright again
    pub bright_before_sleep_minutes: u16,
}

impl Default for BrightnessLevels {
    fn default() -> Self {
        Self {
            low: 80,
            pre_wake: 120,
            waking: 160,
            high: 200,
            bright_after_awake_minutes: 30,
            bright_before_sleep_minutes: 10,
        }
    }
}

/// Result of one schedule evaluation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub state: DisplayState,
    /// Completion of the current window, `[0, 1]`
    pub progress: f32,
    /// Backlight level for the panel
    pub brightness: u8,
}

/// Fraction of a window of `window` seconds that has elapsed when
/// `remaining` seconds are left. A zero-length window is already complete.
fn window_progress(remaining: i64, window: i64) -> f32 {
    if window == 0 {
        return 1.0;
    }
    (1.0 - remaining as f32 / window as f32).clamp(0.0, 1.0)
}

/// Evaluate the schedule at `now`.
pub fn evaluate(now: ClockTime, config: &ScheduleConfig, levels: &BrightnessLevels) -> Evaluation {
    let time = now.minute_of_day();

    if time > config.sleep_time {
        return Evaluation {
            state: DisplayState::Sleeping,
            progress: 0.0,
            brightness: levels.low,
        };
    }

    if time < config.awake_time {
        let seconds_to_wait = config.awake_time as i64 * 60 - now.second_of_day() as i64;
        let transition_seconds = config.awake_transition_minutes as i64 * 60;

        if seconds_to_wait < transition_seconds {
            return Evaluation {
                state: DisplayState::WakingUp,
                progress: window_progress(seconds_to_wait, transition_seconds),
                brightness: levels.waking,
            };
        }
        if seconds_to_wait < 2 * transition_seconds {
            return Evaluation {
                state: DisplayState::Sleeping,
                progress: window_progress(seconds_to_wait - transition_seconds, transition_seconds),
                brightness: levels.pre_wake,
            };
        }
        return Evaluation {
            state: DisplayState::Sleeping,
            progress: 0.0,
            brightness: levels.low,
        };
    }

    let just_woke = time < config.awake_time.saturating_add(levels.bright_after_awake_minutes);
    let almost_bedtime = config.sleep_time - time < levels.bright_before_sleep_minutes;
    Evaluation {
        state: DisplayState::Awake,
        progress: 1.0,
        brightness: if just_woke || almost_bedtime {
            levels.high
        } else {
            levels.low
        },
    }
}
