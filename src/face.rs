//! Analog clock face renderer
//!
//! The face is composed in its own square sprite of `2 * radius + 1` pixels
//! so the center falls on a pixel. Angles are in degrees measured the way the
//! trigonometric functions measure them: 0 points to 3 o'clock and angles grow
//! clockwise on screen (y grows downwards).

use crate::config::DisplayConfig;
use crate::framebuffer::{rgb565_from_hex, FrameBuffer};
use crate::raster::Rasterizer;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{Rgb565, RgbColor},
    prelude::*,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

/// Needles and numerals
pub const FACE_COLOR: Rgb565 = rgb565_from_hex(0x004488);
/// Dial background
pub const DIAL_COLOR: Rgb565 = Rgb565::WHITE;

/// Degrees per hour on the dial
const HOUR_ANGLE: f32 = 360.0 / 12.0;
/// Degrees per minute on the dial
const MINUTE_ANGLE: f32 = 360.0 / 60.0;

/// Rotate an angle measured from 12 o'clock onto the 3 o'clock reference
/// used by `cos`/`sin`.
///
/// `0..=90` maps onto `270..=360`, everything above 90 moves back by 90, so
/// results stay within one turn.
pub fn fix_position(angle: f32) -> f32 {
    if angle <= 90.0 {
        angle + 270.0
    } else {
        angle - 90.0
    }
}

/// Needle angles for a wall-clock time, already rotated by [`fix_position`].
///
/// Returns `(hour_angle, minute_angle)`.
pub fn needle_angles(hour: u8, minute: u8) -> (f32, f32) {
    let hour = hour % 12;
    let hour_position = HOUR_ANGLE * (hour as f32 + minute as f32 / 60.0);
    let minute_position = MINUTE_ANGLE * minute as f32;
    (fix_position(hour_position), fix_position(minute_position))
}

/// Numeral printed at dial index `index` (0 = 3 o'clock position).
pub fn dial_numeral(index: u32) -> u32 {
    match (index + 3) % 12 {
        0 => 12,
        n => n,
    }
}

/// Renders the dial and needles into its own sprite
pub struct ClockFace {
    radius: i32,
    dial_radius: f32,
    needle_half_width: f32,
    rasterizer: Rasterizer,
    sprite: FrameBuffer,
}

impl ClockFace {
    pub fn new(config: &DisplayConfig, rasterizer: Rasterizer) -> Self {
        let side = config.clock_radius * 2 + 1;
        Self {
            radius: config.clock_radius as i32,
            dial_radius: config.clock_radius.saturating_sub(config.dial_inset) as f32,
            needle_half_width: config.needle_half_width,
            rasterizer,
            sprite: FrameBuffer::new(side, side),
        }
    }

    /// The composed face, ready to be copied onto the screen.
    pub fn sprite(&self) -> &FrameBuffer {
        &self.sprite
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// End point of a needle of `length` pointing at `angle` degrees.
    pub fn needle_tip(&self, angle: f32, length: f32) -> (f32, f32) {
        let (sin, cos) = angle.to_radians().sin_cos();
        let center = self.radius as f32;
        (center + length * cos, center + length * sin)
    }

    fn draw_needle(&mut self, angle: f32, length: f32) {
        let center = self.radius as f32;
        let (x, y) = self.needle_tip(angle, length);
        self.rasterizer.draw_wide_line_aa(
            &mut self.sprite,
            center,
            center,
            x,
            y,
            self.needle_half_width,
            FACE_COLOR,
        );
    }

    /// Redraw the whole face with needles at the given angles.
    pub fn render_face(&mut self, hour_angle: f32, minute_angle: f32) {
        let r = self.radius;
        self.sprite.fill(Rgb565::BLACK);
        self.rasterizer.fill_circle_aa(&mut self.sprite, r, r, r, DIAL_COLOR);

        let numeral_style = MonoTextStyle::new(&FONT_6X10, FACE_COLOR);
        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        for index in 0..12u32 {
            let (sin, cos) = (index as f32 * HOUR_ANGLE).to_radians().sin_cos();
            let x = r as f32 + self.dial_radius * cos;
            let y = r as f32 + self.dial_radius * sin;
            let numeral = dial_numeral(index).to_string();
            Text::with_text_style(
                &numeral,
                Point::new(x.round() as i32, y.round() as i32),
                numeral_style,
                centered,
            )
            .draw(&mut self.sprite)
            .ok();
        }

        self.draw_needle(hour_angle, (r / 3) as f32);
        self.draw_needle(minute_angle, (r - 16).max(0) as f32);
        self.rasterizer.fill_circle_aa(&mut self.sprite, r, r, 3, FACE_COLOR);
    }

    /// Redraw the face for a wall-clock time.
    pub fn show_time(&mut self, hour: u8, minute: u8) {
        let (hour_angle, minute_angle) = needle_angles(hour, minute);
        self.render_face(hour_angle, minute_angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn face() -> ClockFace {
        ClockFace::new(&Config::default().display, Rasterizer::new(1.0))
    }

    #[test]
    fn test_fix_position_rotates_reference() {
        assert_eq!(fix_position(0.0), 270.0);
        assert_eq!(fix_position(90.0), 360.0);
        assert_eq!(fix_position(90.5), 0.5);
        assert_eq!(fix_position(180.0), 90.0);
        assert_eq!(fix_position(359.0), 269.0);
    }

    #[test]
    fn test_fix_position_is_invertible() {
        let unfix = |y: f32| if y >= 270.0 { y - 270.0 } else { y + 90.0 };
        let mut angle = 0.0f32;
        while angle < 360.0 {
            let fixed = fix_position(angle);
            assert!(fixed > 0.0 && fixed <= 360.0);
            assert!((unfix(fixed) - angle).abs() < 1e-4, "angle {angle}");
            angle += 0.25;
        }
    }

    #[test]
    fn test_needle_angles() {
        // 12:00, both needles straight up
        assert_eq!(needle_angles(12, 0), (270.0, 270.0));
        assert_eq!(needle_angles(0, 0), (270.0, 270.0));
        // 03:00, hour needle at 3 o'clock
        assert_eq!(needle_angles(15, 0), (360.0, 270.0));
        // 06:30
        let (h, m) = needle_angles(6, 30);
        assert!((h - 105.0).abs() < 1e-4);
        assert!((m - 90.0).abs() < 1e-4);
        // 09:45
        let (h, m) = needle_angles(21, 45);
        assert!((h - 202.5).abs() < 1e-4);
        assert!((m - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_dial_numerals() {
        let numerals: Vec<u32> = (0..12).map(dial_numeral).collect();
        assert_eq!(numerals, vec![3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 1, 2]);
    }

    #[test]
    fn test_needle_tip_points_up_at_twelve() {
        let face = face();
        let (x, y) = face.needle_tip(270.0, 30.0);
        assert!((x - 46.0).abs() < 1e-3);
        assert!((y - 16.0).abs() < 1e-3);
    }

    #[test]
    fn test_render_draws_needles() {
        let mut face = face();
        face.show_time(3, 0);
        let sprite = face.sprite();
        assert_eq!(sprite.width(), 93);

        // Hour needle towards 3 o'clock, minute needle towards 12
        assert_eq!(sprite.get(46 + 10, 46), Some(FACE_COLOR));
        assert_eq!(sprite.get(46, 46 - 20), Some(FACE_COLOR));
        // Away from both needles the dial shows through
        assert_eq!(sprite.get(46 - 10, 46 + 10), Some(DIAL_COLOR));
        // Corners lie outside the dial
        assert_eq!(sprite.get(0, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_render_replaces_previous_needles() {
        let mut face = face();
        face.show_time(3, 0);
        face.show_time(9, 30);
        let sprite = face.sprite();
        assert_eq!(sprite.get(46 + 10, 46), Some(DIAL_COLOR));
        // Hour needle just above 9 o'clock, minute needle straight down
        assert_eq!(sprite.get(46 - 10, 46 - 3), Some(FACE_COLOR));
        assert_eq!(sprite.get(46, 46 + 20), Some(FACE_COLOR));
    }
}
