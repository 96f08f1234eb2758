//! Status box and progress bar
//!
//! The top-right corner of the screen tells the child what the clock means
//! right now: a colored label, a 3x3 field of paw ornaments while not awake,
//! and a glyph in the bottom-right corner. The paws double as the progress
//! bar: [`StatusOverlay::update_progress`] wipes them out row by row as the
//! current window elapses.

use crate::framebuffer::{rgb565_from_hex, FrameBuffer};
use crate::raster::Rasterizer;
use crate::DisplayState;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{Rgb565, RgbColor},
    prelude::*,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use serde::{Deserialize, Serialize};

/// Height of one ornament row, also the progress band height
const ROW_HEIGHT: i32 = 18;
/// Ornament tile size
const TILE: i32 = 16;
/// Left margin of the ornament field inside the status box
const FIELD_X: i32 = 7;
/// Top of the ornament field
const FIELD_Y: i32 = 15;
/// Progress covered by one band
const BAND: f32 = 0.33;
/// Width of the state glyph area in the bottom-right corner
const GLYPH_SIZE: i32 = 64;
/// The glyph area starts below the ornament field
const GLYPH_TOP: i32 = FIELD_Y + 3 * ROW_HEIGHT;

const PAW_COLOR: Rgb565 = rgb565_from_hex(0xC8A070);
const DARK_GREEN: Rgb565 = rgb565_from_hex(0x006400);

/// Label language
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Dutch,
    English,
}

/// Procedural state glyph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    /// Crescent moon
    Sleep,
    /// Rising sun: ring around a small disk
    Calm,
    /// Full sun with rays
    Awake,
}

/// What the status box shows for one state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusVisual {
    pub glyph: Glyph,
    pub label: &'static str,
    pub color: Rgb565,
}

impl StatusVisual {
    /// Ornaments are only shown while the child should stay in bed.
    pub fn shows_ornaments(&self) -> bool {
        self.glyph != Glyph::Awake
    }
}

/// Map a state to its glyph, label and color; `Invalid` shows nothing.
pub fn status_visual(state: DisplayState, language: Language) -> Option<StatusVisual> {
    let (glyph, dutch, english, color) = match state {
        DisplayState::Sleeping => (Glyph::Sleep, "Slapen", "Sleeping", Rgb565::RED),
        DisplayState::WakingUp => (Glyph::Calm, "Rustig", "Calm", Rgb565::YELLOW),
        DisplayState::Awake => (Glyph::Awake, "Wakker", "Awake", DARK_GREEN),
        DisplayState::Invalid => return None,
    };
    let label = match language {
        Language::Dutch => dutch,
        Language::English => english,
    };
    Some(StatusVisual {
        glyph,
        label,
        color,
    })
}

/// Width in pixels hidden in one progress band.
///
/// `remaining` is the progress left after the earlier bands consumed theirs.
pub fn band_width(remaining: f32, full_width: i32) -> i32 {
    let fraction = (remaining / BAND).clamp(0.0, 1.0);
    (full_width as f32 * fraction).round() as i32
}

/// Draws the status box and progress bar onto the screen buffer
pub struct StatusOverlay {
    screen_width: i32,
    screen_height: i32,
    box_size: i32,
    language: Language,
    rasterizer: Rasterizer,
}

impl StatusOverlay {
    pub fn new(
        screen_width: u32,
        screen_height: u32,
        box_size: u32,
        language: Language,
        rasterizer: Rasterizer,
    ) -> Self {
        Self {
            screen_width: screen_width as i32,
            screen_height: screen_height as i32,
            box_size: box_size as i32,
            language,
            rasterizer,
        }
    }

    fn box_x(&self) -> i32 {
        self.screen_width - self.box_size
    }

    /// Redraw the status box for `state`.
    pub fn update_status(&self, screen: &mut FrameBuffer, state: DisplayState) {
        if let Some(visual) = status_visual(state, self.language) {
            self.draw_status(screen, &visual);
        }
    }

    /// Clear the status box and draw label, ornaments and glyph.
    pub fn draw_status(&self, screen: &mut FrameBuffer, visual: &StatusVisual) {
        let box_x = self.box_x();
        screen.fill_rect(box_x, 0, self.box_size, GLYPH_TOP, Rgb565::BLACK);

        let style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        Text::with_text_style(
            visual.label,
            Point::new(box_x + self.box_size / 2, 0),
            MonoTextStyle::new(&FONT_6X10, visual.color),
            style,
        )
        .draw(screen)
        .ok();

        if visual.shows_ornaments() {
            for col in 0..3 {
                for row in 0..3 {
                    let x = box_x + FIELD_X + col * ROW_HEIGHT;
                    self.draw_paw(screen, x, FIELD_Y + row * ROW_HEIGHT);
                }
            }
        }

        self.draw_glyph(screen, visual);
    }

    /// Hide the ornament field left to right, row by row, in proportion to
    /// `progress`.
    pub fn update_progress(&self, screen: &mut FrameBuffer, progress: f32) {
        let full_width = ROW_HEIGHT * 3;
        let mut remaining = progress;
        let mut line_y = FIELD_Y;
        for _ in 0..3 {
            let width = band_width(remaining, full_width);
            screen.fill_rect(self.box_x() + FIELD_X, line_y, width, ROW_HEIGHT, Rgb565::BLACK);
            line_y += ROW_HEIGHT;
            remaining -= BAND;
        }
    }

    /// One 16x16 paw print: a pad and three toes.
    fn draw_paw(&self, screen: &mut FrameBuffer, x: i32, y: i32) {
        let r = &self.rasterizer;
        r.fill_circle_aa(screen, x + TILE / 2, y + 10, 4, PAW_COLOR);
        r.fill_circle_aa(screen, x + 3, y + 4, 2, PAW_COLOR);
        r.fill_circle_aa(screen, x + TILE / 2, y + 2, 2, PAW_COLOR);
        r.fill_circle_aa(screen, x + TILE - 3, y + 4, 2, PAW_COLOR);
    }

    fn draw_glyph(&self, screen: &mut FrameBuffer, visual: &StatusVisual) {
        let x = self.screen_width - GLYPH_SIZE;
        let height = self.screen_height - GLYPH_TOP;
        screen.fill_rect(x, GLYPH_TOP, GLYPH_SIZE, height, Rgb565::BLACK);

        let cx = x + GLYPH_SIZE / 2;
        let cy = GLYPH_TOP + height / 2;
        let r = &self.rasterizer;
        match visual.glyph {
            Glyph::Sleep => {
                r.fill_circle_aa(screen, cx, cy, 22, visual.color);
                r.fill_circle_aa(screen, cx + 9, cy - 7, 19, Rgb565::BLACK);
            }
            Glyph::Calm => {
                r.draw_circle_aa(screen, cx, cy, 22, visual.color);
                r.fill_circle_aa(screen, cx, cy, 12, visual.color);
            }
            Glyph::Awake => {
                for i in 0..8 {
                    let angle = (i as f32 * 45.0).to_radians();
                    let (sin, cos) = angle.sin_cos();
                    r.draw_wide_line_aa(
                        screen,
                        cx as f32 + 17.0 * cos,
                        cy as f32 + 17.0 * sin,
                        cx as f32 + 24.0 * cos,
                        cy as f32 + 24.0 * sin,
                        1.5,
                        visual.color,
                    );
                }
                r.fill_circle_aa(screen, cx, cy, 14, visual.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> StatusOverlay {
        StatusOverlay::new(160, 128, 64, Language::Dutch, Rasterizer::default())
    }

    fn non_black_in(fb: &FrameBuffer, x0: i32, y0: i32, w: i32, h: i32) -> usize {
        let mut count = 0;
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                if fb.get(x, y) != Some(Rgb565::BLACK) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_status_visual_mapping() {
        let sleeping = status_visual(DisplayState::Sleeping, Language::Dutch).unwrap();
        assert_eq!(sleeping.label, "Slapen");
        assert_eq!(sleeping.color, Rgb565::RED);
        assert_eq!(sleeping.glyph, Glyph::Sleep);

        let waking = status_visual(DisplayState::WakingUp, Language::English).unwrap();
        assert_eq!(waking.label, "Calm");
        assert_eq!(waking.color, Rgb565::YELLOW);

        let awake = status_visual(DisplayState::Awake, Language::Dutch).unwrap();
        assert_eq!(awake.label, "Wakker");
        assert!(!awake.shows_ornaments());
        assert!(sleeping.shows_ornaments());

        assert!(status_visual(DisplayState::Invalid, Language::Dutch).is_none());
    }

    #[test]
    fn test_band_width() {
        assert_eq!(band_width(0.0, 54), 0);
        assert_eq!(band_width(-0.5, 54), 0);
        assert_eq!(band_width(0.165, 54), 27);
        assert_eq!(band_width(0.33, 54), 54);
        assert_eq!(band_width(1.0, 54), 54);
    }

    #[test]
    fn test_sleeping_status_draws_ornaments() {
        let mut screen = FrameBuffer::new(160, 128);
        overlay().update_status(&mut screen, DisplayState::Sleeping);
        // Ornament field below the label
        assert!(non_black_in(&screen, 96 + 7, 15, 54, 54) > 0);
        // Glyph corner
        assert!(non_black_in(&screen, 96, 69, 64, 59) > 0);
        // Clock face area untouched
        assert_eq!(non_black_in(&screen, 0, 0, 90, 128), 0);
    }

    #[test]
    fn test_awake_status_has_no_ornaments() {
        let mut screen = FrameBuffer::new(160, 128);
        overlay().update_status(&mut screen, DisplayState::Awake);
        assert_eq!(non_black_in(&screen, 96 + 7, 15, 54, 48), 0);
        // Label row is drawn
        assert!(non_black_in(&screen, 96, 0, 64, 10) > 0);
    }

    #[test]
    fn test_full_progress_wipes_ornaments() {
        let mut screen = FrameBuffer::new(160, 128);
        let overlay = overlay();
        overlay.update_status(&mut screen, DisplayState::Sleeping);
        overlay.update_progress(&mut screen, 1.0);
        assert_eq!(non_black_in(&screen, 96 + 7, 15, 54, 54), 0);
    }

    #[test]
    fn test_partial_progress_wipes_first_band_only() {
        let mut screen = FrameBuffer::new(160, 128);
        let overlay = overlay();
        overlay.update_status(&mut screen, DisplayState::Sleeping);
        overlay.update_progress(&mut screen, 0.33);
        assert_eq!(non_black_in(&screen, 96 + 7, 15, 54, 18), 0);
        assert!(non_black_in(&screen, 96 + 7, 33, 54, 18) > 0);
        assert!(non_black_in(&screen, 96 + 7, 51, 54, 18) > 0);
    }
}
