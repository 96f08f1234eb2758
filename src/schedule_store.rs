//! Persisted schedule and its shared snapshot
//!
//! The schedule a parent sets is stored as three little-endian `u16` values
//! (sleep time, awake time, transition minutes), six bytes in total. Writers
//! publish a whole [`ScheduleConfig`] through a [`SharedSchedule`]; the control
//! loop copies one snapshot per evaluation, so it never sees a half-updated
//! schedule.

use crate::schedule::ScheduleConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Size of the encoded schedule
pub const SCHEDULE_BYTES: usize = 6;

/// Errors that can occur while reading or writing the schedule file
#[derive(Error, Debug)]
pub enum ScheduleStoreError {
    /// Reading or writing the file failed
    #[error("schedule file IO: {0}")]
    Io(#[from] io::Error),

    /// The file holds fewer than the six bytes of a schedule
    #[error("schedule file too short: {len} bytes")]
    Truncated { len: usize },
}

impl ScheduleConfig {
    /// Encode as sleep, awake, transition; each a little-endian `u16`.
    pub fn to_bytes(&self) -> [u8; SCHEDULE_BYTES] {
        let mut bytes = [0u8; SCHEDULE_BYTES];
        bytes[0..2].copy_from_slice(&self.sleep_time.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.awake_time.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.awake_transition_minutes.to_le_bytes());
        bytes
    }

    /// Decode the first six bytes; trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScheduleStoreError> {
        if bytes.len() < SCHEDULE_BYTES {
            return Err(ScheduleStoreError::Truncated { len: bytes.len() });
        }
        let word = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        Ok(Self {
            sleep_time: word(0),
            awake_time: word(2),
            awake_transition_minutes: word(4),
        })
    }
}

/// Read the schedule file. A missing file is not an error.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<ScheduleConfig>, ScheduleStoreError> {
    match fs::read(path.as_ref()) {
        Ok(bytes) => ScheduleConfig::from_bytes(&bytes).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write the schedule file, replacing any previous content.
pub fn save<P: AsRef<Path>>(path: P, schedule: &ScheduleConfig) -> Result<(), ScheduleStoreError> {
    fs::write(path.as_ref(), schedule.to_bytes())?;
    info!(path = %path.as_ref().display(), "schedule saved");
    Ok(())
}

/// Single-writer, many-reader handle to the active schedule
#[derive(Debug)]
pub struct SharedSchedule {
    tx: watch::Sender<ScheduleConfig>,
}

impl SharedSchedule {
    pub fn new(initial: ScheduleConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the schedule. Returns whether it differed from the current one.
    pub fn publish(&self, schedule: ScheduleConfig) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == schedule {
                false
            } else {
                *current = schedule;
                true
            }
        })
    }

    pub fn snapshot(&self) -> ScheduleConfig {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ScheduleReader {
        ScheduleReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of a [`SharedSchedule`]
#[derive(Debug, Clone)]
pub struct ScheduleReader {
    rx: watch::Receiver<ScheduleConfig>,
}

impl ScheduleReader {
    pub fn snapshot(&self) -> ScheduleConfig {
        *self.rx.borrow()
    }

    /// Whether a new schedule was published since the last [`Self::mark_seen`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }
}

/// Re-read `path` every `every` and publish the schedule when it changed.
///
/// Runs until the task is dropped. Read errors are logged and the current
/// schedule stays active.
pub async fn watch_file(shared: SharedSchedule, path: PathBuf, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match load(&path) {
            Ok(Some(schedule)) => {
                if shared.publish(schedule) {
                    info!(
                        sleep = %crate::schedule::format_hhmm(schedule.sleep_time),
                        awake = %crate::schedule::format_hhmm(schedule.awake_time),
                        transition = schedule.awake_transition_minutes,
                        "schedule reloaded"
                    );
                    if !schedule.is_well_ordered() {
                        warn!("stored wake-up time is not before bedtime");
                    }
                }
            }
            Ok(None) => debug!(path = %path.display(), "no schedule file"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to read schedule file"),
        }
    }
}
