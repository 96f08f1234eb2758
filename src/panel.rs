//! Panel output
//!
//! A [`Panel`] receives the composed frame in one transfer and controls the
//! backlight. Hardware drivers implement the trait; this module ships a
//! terminal panel for development and an in-memory panel for tests and
//! headless runs.

use crate::framebuffer::FrameBuffer;
use embedded_graphics::pixelcolor::RgbColor;
use std::io::{self, Write};
use thiserror::Error;

/// Errors that can occur while pushing a frame to a panel
#[derive(Error, Debug)]
pub enum PanelError {
    /// Writing the frame failed
    #[error("panel IO: {0}")]
    Io(#[from] io::Error),

    /// The frame does not match the panel resolution
    #[error("frame is {got_width}x{got_height}, panel is {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
}

/// A display that accepts whole frames and has a dimmable backlight
pub trait Panel {
    /// Set backlight level, 0 = off, 255 = full
    fn set_brightness(&mut self, level: u8);

    /// Transfer a complete frame to the panel.
    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), PanelError>;
}

/// Luminance ramp from dark to bright
const RAMP: &[u8] = b" .:-=+*#%@";

/// Shade character for one RGB565 pixel.
fn shade<C: RgbColor>(color: C) -> char {
    // Scale each channel to 0..=255 before weighting
    let r = color.r() as u32 * 255 / C::MAX_R as u32;
    let g = color.g() as u32 * 255 / C::MAX_G as u32;
    let b = color.b() as u32 * 255 / C::MAX_B as u32;
    let luma = (r * 299 + g * 587 + b * 114) / 1000;
    RAMP[(luma as usize * (RAMP.len() - 1)) / 255] as char
}

/// Render a frame as text, one character per pixel, every second row.
///
/// Terminal cells are about twice as tall as they are wide, so skipping rows
/// keeps the face round.
pub fn frame_to_ascii(frame: &FrameBuffer) -> String {
    let mut out = String::with_capacity(((frame.width() + 1) * frame.height() / 2) as usize);
    for y in (0..frame.height() as i32).step_by(2) {
        for x in 0..frame.width() as i32 {
            out.push(frame.get(x, y).map(shade).unwrap_or(' '));
        }
        out.push('\n');
    }
    out
}

/// Development panel printing frames to a terminal
pub struct TerminalPanel<W: Write> {
    out: W,
    brightness: u8,
    clear_screen: bool,
}

impl TerminalPanel<io::Stdout> {
    /// Print to stdout. With `clear_screen` each frame redraws in place.
    pub fn stdout(clear_screen: bool) -> Self {
        Self::new(io::stdout(), clear_screen)
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self {
            out,
            brightness: 255,
            clear_screen,
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Panel for TerminalPanel<W> {
    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), PanelError> {
        if self.clear_screen {
            // Home the cursor and clear so the frame redraws in place
            write!(self.out, "\x1b[H\x1b[2J")?;
        }
        self.out.write_all(frame_to_ascii(frame).as_bytes())?;
        writeln!(self.out, "backlight {}/255", self.brightness)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Panel that keeps the last frame in memory
#[derive(Debug)]
pub struct MemoryPanel {
    width: u32,
    height: u32,
    brightness: Option<u8>,
    frame: Option<FrameBuffer>,
    flushes: usize,
}

impl MemoryPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            brightness: None,
            frame: None,
            flushes: 0,
        }
    }

    /// Last backlight level set, if any
    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    /// Last flushed frame, if any
    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl Panel for MemoryPanel {
    fn set_brightness(&mut self, level: u8) {
        self.brightness = Some(level);
    }

    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), PanelError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(PanelError::SizeMismatch {
                width: self.width,
                height: self.height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }
        match self.frame.as_mut() {
            Some(existing) => existing.clone_from(frame),
            None => self.frame = Some(frame.clone()),
        }
        self.flushes += 1;
        Ok(())
    }
}
