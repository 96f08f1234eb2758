//! Screen composition
//!
//! [`Display`] owns the off-screen screen buffer, the clock face sprite, the
//! status overlay and the panel. Each [`Display::render`] composes a complete
//! frame and pushes it to the panel in one transfer.

use crate::config::DisplayConfig;
use crate::face::ClockFace;
use crate::framebuffer::FrameBuffer;
use crate::panel::{Panel, PanelError};
use crate::raster::Rasterizer;
use crate::status::StatusOverlay;
use crate::DisplayState;
use tracing::debug;

/// The clock's screen and the panel it is shown on
pub struct Display<P: Panel> {
    panel: P,
    screen: FrameBuffer,
    face: ClockFace,
    status: StatusOverlay,
    current_state: DisplayState,
}

impl<P: Panel> Display<P> {
    pub fn new(config: &DisplayConfig, panel: P) -> Self {
        let rasterizer = Rasterizer::new(config.alpha_gain);
        Self {
            panel,
            screen: FrameBuffer::new(config.width, config.height),
            face: ClockFace::new(config, rasterizer),
            status: StatusOverlay::new(
                config.width,
                config.height,
                config.status_box_size,
                config.language,
                rasterizer,
            ),
            current_state: DisplayState::Invalid,
        }
    }

    /// State shown by the last render, `Invalid` before the first one
    pub fn current_state(&self) -> DisplayState {
        self.current_state
    }

    pub fn screen(&self) -> &FrameBuffer {
        &self.screen
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn set_brightness(&mut self, level: u8) {
        self.panel.set_brightness(level);
    }

    /// Compose the frame for `hour:minute` in `state` and push it out.
    ///
    /// The face is always redrawn. The status box only changes when the state
    /// differs from the one last rendered. The progress bar is drawn on every
    /// render while not awake.
    pub fn render(
        &mut self,
        hour: u8,
        minute: u8,
        state: DisplayState,
        progress: f32,
    ) -> Result<(), PanelError> {
        self.face.show_time(hour, minute);
        self.screen.blit(self.face.sprite(), 0, 0);

        if state != self.current_state {
            debug!(from = %self.current_state, to = %state, "status changed");
            self.current_state = state;
            self.status.update_status(&mut self.screen, state);
        }
        if state != DisplayState::Awake {
            self.status.update_progress(&mut self.screen, progress);
        }

        self.panel.flush(&self.screen)
    }
}
