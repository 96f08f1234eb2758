//! # Kids Clock Application Entry Point
//!
//! This binary wires the clock together: it loads the configuration and the
//! persisted schedule, then runs the control loop that polls the time, evaluates
//! the schedule, renders the frame and sets the backlight.
//! It supports both production mode (continuous loop) and development mode
//! (`--stdout`, a single ASCII frame).

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use kids_clock_lib::{
    config::Config,
    display::Display,
    panel::{Panel, TerminalPanel},
    schedule::{evaluate, format_hhmm, BrightnessLevels, ScheduleConfig},
    schedule_store::{self, ScheduleReader, SharedSchedule},
    time_source::{parse_clock_time, FixedTime, SystemClock, TimeSource},
    ClockTime,
};
use std::env;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// One iteration of work for the control loop
pub struct Controller<P: Panel> {
    time: Box<dyn TimeSource>,
    display: Display<P>,
    schedule: ScheduleReader,
    levels: BrightnessLevels,
    brightness: Option<u8>,
}

impl<P: Panel> Controller<P> {
    pub fn new(
        time: Box<dyn TimeSource>,
        display: Display<P>,
        schedule: ScheduleReader,
        levels: BrightnessLevels,
    ) -> Self {
        Self {
            time,
            display,
            schedule,
            levels,
            brightness: None,
        }
    }

    #[allow(dead_code)]
    pub fn display(&self) -> &Display<P> {
        &self.display
    }

    /// Poll the time source and, on a new second, redraw and set the backlight.
    ///
    /// Returns whether a frame was rendered. Panel failures are logged and
    /// retried on the next tick.
    pub fn poll(&mut self) -> bool {
        if !self.time.process() {
            return false;
        }
        let now = self.time.now();
        if self.schedule.has_changed() {
            self.schedule.mark_seen();
            debug!("using updated schedule");
        }
        let schedule = self.schedule.snapshot();
        let evaluation = evaluate(now, &schedule, &self.levels);

        let previous = self.display.current_state();
        if evaluation.state != previous {
            info!(time = %now, from = %previous, to = %evaluation.state, "state transition");
        }
        if let Err(e) = self
            .display
            .render(now.hour, now.minute, evaluation.state, evaluation.progress)
        {
            error!(error = %e, "failed to flush frame");
        }

        if self.brightness != Some(evaluation.brightness) {
            info!(level = evaluation.brightness, "backlight changed");
            self.brightness = Some(evaluation.brightness);
        }
        self.display.set_brightness(evaluation.brightness);
        true
    }
}

/// Pick up `--at HH:MM[:SS]` from the command line.
fn time_override(args: &[String]) -> anyhow::Result<Option<ClockTime>> {
    let Some(position) = args.iter().position(|arg| arg == "--at") else {
        return Ok(None);
    };
    let value = args
        .get(position + 1)
        .context("--at needs a time, e.g. --at 06:56")?;
    parse_clock_time(value)
        .map(Some)
        .with_context(|| format!("invalid time for --at: {value}"))
}

/// Schedule from the store, or the configured one when there is no usable file.
fn initial_schedule(config: &Config) -> ScheduleConfig {
    match schedule_store::load(&config.store.schedule_path) {
        Ok(Some(schedule)) => {
            info!(
                sleep = %format_hhmm(schedule.sleep_time),
                awake = %format_hhmm(schedule.awake_time),
                "loaded stored schedule"
            );
            schedule
        }
        Ok(None) => config.schedule,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable schedule file");
            config.schedule
        }
    }
}

/// Development mode: render a single frame to stdout.
fn render_once(config: &Config, schedule: ScheduleReader, at: Option<ClockTime>) {
    let time = at.unwrap_or_else(|| {
        let mut clock = SystemClock::new(config.time.utc_offset_minutes);
        if !clock.process() {
            warn!("host clock not synced, showing 00:00");
        }
        clock.now()
    });
    let display = Display::new(&config.display, TerminalPanel::stdout(false));
    let mut controller = Controller::new(
        Box::new(FixedTime::new(time)),
        display,
        schedule,
        config.brightness,
    );
    controller.poll();
}

/// Production mode: run the control loop and the schedule reload task forever.
async fn run(config: Config, shared: SharedSchedule, at: Option<ClockTime>) {
    let reader = shared.subscribe();
    tokio::spawn(schedule_store::watch_file(
        shared,
        config.store.schedule_path.clone(),
        Duration::from_secs(config.store.reload_interval_secs.max(1)),
    ));

    let time: Box<dyn TimeSource> = match at {
        Some(time) => Box::new(FixedTime::new(time)),
        None => Box::new(SystemClock::new(config.time.utc_offset_minutes)),
    };
    let display = Display::new(&config.display, TerminalPanel::stdout(true));
    let mut controller = Controller::new(time, display, reader, config.brightness);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.time.poll_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(poll_ms = config.time.poll_interval_ms, "control loop started");
    loop {
        ticker.tick().await;
        controller.poll();
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the ASCII frame on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    // Development mode: render to stdout for testing without hardware
    let development_mode = args.iter().any(|arg| arg == "--stdout");
    let at = time_override(&args)?;

    let config = Config::load();
    let shared = SharedSchedule::new(initial_schedule(&config));

    if development_mode {
        render_once(&config, shared.subscribe(), at);
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(run(config, shared, at));
    Ok(())
}
