//! Off-screen RGB565 frame buffer
//!
//! Both the clock-face sprite and the full screen are composed in a
//! [`FrameBuffer`] before anything reaches the panel. Writes outside the
//! buffer are dropped, so drawing code never has to bounds-check.

use embedded_graphics::{
    pixelcolor::{Rgb565, RgbColor},
    prelude::*,
};

/// Convert a `0xRRGGBB` web color to RGB565 by truncating each channel.
pub const fn rgb565_from_hex(hex: u32) -> Rgb565 {
    Rgb565::new(
        ((hex >> 19) & 0x1F) as u8,
        ((hex >> 10) & 0x3F) as u8,
        ((hex >> 3) & 0x1F) as u8,
    )
}

/// Blend `fg` over `bg` with an 8-bit coverage value.
///
/// Each 5/6/5-bit channel is interpolated linearly; `alpha == 255` yields `fg`
/// and `alpha == 0` yields `bg` exactly.
pub fn alpha_blend(alpha: u8, fg: Rgb565, bg: Rgb565) -> Rgb565 {
    #[inline]
    fn channel(fg: u8, bg: u8, alpha: i32) -> u8 {
        let fg = fg as i32;
        let bg = bg as i32;
        (bg + (fg - bg) * alpha / 255) as u8
    }

    let alpha = alpha as i32;
    Rgb565::new(
        channel(fg.r(), bg.r(), alpha),
        channel(fg.g(), bg.g(), alpha),
        channel(fg.b(), bg.b(), alpha),
    )
}

/// Row-major RGB565 pixel store
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl FrameBuffer {
    /// Create a buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb565] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Read a pixel, `None` when outside the buffer.
    pub fn get(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Write a pixel; out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, color: Rgb565) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(color);
    }

    /// Fill an axis-aligned rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb565) {
        if width < 1 || height < 1 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.width as i32);
        let y1 = (y + height).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.set(px, py, color);
            }
        }
    }

    /// Horizontal run of `length` pixels starting at `(x, y)`.
    pub fn hline(&mut self, x: i32, y: i32, length: i32, color: Rgb565) {
        self.fill_rect(x, y, length, 1, color);
    }

    /// Vertical run of `length` pixels starting at `(x, y)`.
    pub fn vline(&mut self, x: i32, y: i32, length: i32, color: Rgb565) {
        self.fill_rect(x, y, 1, length, color);
    }

    /// Copy `sprite` into this buffer with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, sprite: &FrameBuffer, x: i32, y: i32) {
        for sy in 0..sprite.height as i32 {
            for sx in 0..sprite.width as i32 {
                if let Some(color) = sprite.get(sx, sy) {
                    self.set(x + sx, y + sy, color);
                }
            }
        }
    }

    /// Number of pixels that differ from `color`.
    pub fn count_not(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|&&p| p != color).count()
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color);
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_hex_conversion() {
        assert_eq!(rgb565_from_hex(0xFFFFFF), Rgb565::WHITE);
        assert_eq!(rgb565_from_hex(0x000000), Rgb565::BLACK);
        assert_eq!(rgb565_from_hex(0xFF0000), Rgb565::RED);

        let face = rgb565_from_hex(0x004488);
        assert_eq!((face.r(), face.g(), face.b()), (0, 0x11, 0x11));
    }

    #[test]
    fn test_alpha_blend_extremes() {
        let fg = Rgb565::new(31, 10, 3);
        let bg = Rgb565::new(2, 60, 30);
        assert_eq!(alpha_blend(255, fg, bg), fg);
        assert_eq!(alpha_blend(0, fg, bg), bg);
    }

    #[test]
    fn test_alpha_blend_midpoint() {
        let mixed = alpha_blend(128, Rgb565::WHITE, Rgb565::BLACK);
        // Half coverage of white over black lands near the middle of each channel
        assert!((15..=16).contains(&mixed.r()));
        assert!((31..=32).contains(&mixed.g()));
        assert!((15..=16).contains(&mixed.b()));
    }

    #[test]
    fn test_out_of_bounds_writes_are_dropped() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.set(-1, 0, Rgb565::WHITE);
        fb.set(0, -1, Rgb565::WHITE);
        fb.set(4, 0, Rgb565::WHITE);
        fb.set(0, 3, Rgb565::WHITE);
        assert_eq!(fb.count_not(Rgb565::BLACK), 0);
        assert_eq!(fb.get(4, 0), None);

        fb.set(3, 2, Rgb565::WHITE);
        assert_eq!(fb.get(3, 2), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_fill_rect_clips_and_ignores_negative_size() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.fill_rect(8, 8, 5, 5, Rgb565::RED);
        assert_eq!(fb.count_not(Rgb565::BLACK), 4);

        fb.fill_rect(0, 0, -3, 4, Rgb565::RED);
        assert_eq!(fb.count_not(Rgb565::BLACK), 4);
    }

    #[test]
    fn test_blit_copies_sprite() {
        let mut sprite = FrameBuffer::new(3, 3);
        sprite.fill(Rgb565::GREEN);
        let mut screen = FrameBuffer::new(5, 5);
        screen.blit(&sprite, 3, 3);
        // Only the 2x2 overlap lands on screen
        assert_eq!(screen.count_not(Rgb565::BLACK), 4);
        assert_eq!(screen.get(4, 4), Some(Rgb565::GREEN));
    }

    #[test]
    fn test_draw_target_primitives() {
        let mut fb = FrameBuffer::new(8, 8);
        Rectangle::new(Point::new(6, 6), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
            .draw(&mut fb)
            .ok();
        assert_eq!(fb.count_not(Rgb565::BLACK), 4);
        assert_eq!(fb.size(), Size::new(8, 8));
    }
}
