//! # Kids Clock Core Library
//!
//! This library provides the rendering and scheduling core of a small analog
//! clock that tells a child whether it is time to sleep, to stay calm, or to
//! get up. It is written for a 160x128 RGB565 TFT panel but keeps every
//! calibration value in [`config::Config`].
//!
//! ## Design Philosophy
//!
//! ### Off-screen composition
//! - **One frame buffer**: every drawing operation targets an in-memory
//!   [`framebuffer::FrameBuffer`] which is handed to a [`panel::Panel`] in a
//!   single bulk transfer, so a half-drawn face is never visible
//! - **Blended writes only**: the anti-aliased primitives in [`raster`] read the
//!   pixel underneath and blend towards the requested color
//! - **Clipped writes**: coordinates outside the buffer are dropped, never
//!   written
//!
//! ### Pure scheduling
//! The [`schedule`] state machine is a pure function of the time of day and a
//! [`schedule::ScheduleConfig`] snapshot. Nothing is remembered between ticks,
//! so a skipped tick is simply corrected by the next one.
//!
//! ### Data Flow
//! 1. **Time**: a [`time_source::TimeSource`] reports a new second
//! 2. **Schedule**: the current [`ClockTime`] and a config snapshot produce an
//!    [`schedule::Evaluation`] (state, progress, brightness)
//! 3. **Render**: [`display::Display`] redraws the face, the status box when
//!    the state changed, and the progress bar while not awake
//! 4. **Panel**: the composed frame and brightness go to the panel
//!
//! ## Core Types
//! - [`DisplayState`]: what the clock is currently telling the child
//! - [`ClockTime`]: a wall-clock reading in 24-hour form

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod display;
pub mod face;
pub mod framebuffer;
pub mod panel;
pub mod raster;
pub mod schedule;
pub mod schedule_store;
pub mod status;
pub mod time_source;

/// The state shown by the clock.
///
/// `Invalid` only exists before the first evaluation; the schedule never
/// produces it. The schedule cycles `Awake -> Sleeping -> WakingUp -> Awake`
/// purely as a function of wall-clock time.
///
/// # Example
/// ```
/// use kids_clock_lib::DisplayState;
///
/// let state = DisplayState::default();
/// assert_eq!(state, DisplayState::Invalid);
/// assert_eq!(DisplayState::Sleeping.next(), DisplayState::WakingUp);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayState {
    /// Nothing rendered yet
    #[default]
    Invalid,
    /// Daytime, the child may be up
    Awake,
    /// Night, the child should stay in bed
    Sleeping,
    /// Last stretch before wake-up, the child may play quietly
    WakingUp,
}

impl DisplayState {
    /// The state that follows this one in the daily cycle.
    pub fn next(self) -> Self {
        use DisplayState::*;
        match self {
            Invalid => Awake,
            Awake => Sleeping,
            Sleeping => WakingUp,
            WakingUp => Awake,
        }
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DisplayState::Invalid => "invalid",
            DisplayState::Awake => "awake",
            DisplayState::Sleeping => "sleeping",
            DisplayState::WakingUp => "waking-up",
        };
        f.write_str(name)
    }
}

/// A wall-clock reading in 24-hour form.
///
/// # Example
/// ```
/// use kids_clock_lib::ClockTime;
///
/// let t = ClockTime::new(6, 56, 0);
/// assert_eq!(t.minute_of_day(), 416);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    /// Hour, 0..=23
    pub hour: u8,
    /// Minute, 0..=59
    pub minute: u8,
    /// Second, 0..=59
    pub second: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Minutes elapsed since midnight (0..=1439).
    pub fn minute_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// Seconds elapsed since midnight.
    pub fn second_of_day(&self) -> u32 {
        self.minute_of_day() as u32 * 60 + self.second as u32
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}
