//! # Anti-aliased rasterization
//!
//! Coverage-weighted drawing primitives for low-resolution panels. Every
//! primitive computes a coverage value in `[0, 1]` per pixel and blends the
//! requested color over whatever is already in the [`FrameBuffer`].
//!
//! ## Primitives
//! - [`Rasterizer::plot_pixel`]: gain-corrected alpha blend of one pixel
//! - [`line_distance`]: distance from a point to a segment
//! - [`Rasterizer::draw_wide_line_aa`]: capsule (thick line, round caps)
//! - [`Rasterizer::draw_round_rect_aa`]: rounded rectangle outline using an
//!   incremental midpoint-ellipse scan with fractional coverage
//! - [`Rasterizer::draw_circle_aa`] / [`Rasterizer::fill_circle_aa`]
//!
//! ## Alpha gain
//! Small TFT panels have a steep gamma response, so partially covered pixels
//! look too faint. `alpha_gain` scales coverage before blending; `1.0` is
//! physically correct, values up to about `1.3` compensate for the panel.

use crate::framebuffer::{alpha_blend, FrameBuffer};
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, PrimitiveStyle},
};

/// Default coverage gain
pub const DEFAULT_ALPHA_GAIN: f32 = 1.0;

/// Distance from `(px, py)` to the closest point of segment `a`-`b`.
///
/// The projection of the point onto the segment is clamped to the segment,
/// so beyond either end the distance to that endpoint is returned.
pub fn line_distance(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (pax, pay) = (px - ax, py - ay);
    let (bax, bay) = (bx - ax, by - ay);
    let length_sq = bax * bax + bay * bay;
    let h = if length_sq == 0.0 {
        0.0
    } else {
        ((pax * bax + pay * bay) / length_sq).clamp(0.0, 1.0)
    };
    let (dx, dy) = (pax - bax * h, pay - bay * h);
    (dx * dx + dy * dy).sqrt()
}

/// Coverage of a pixel whose center lies `distance` from the axis of a
/// capsule with half-width `radius`.
///
/// The edge is a one pixel wide band centered on `radius`: exactly `0.5` at
/// the edge, `1` from `radius - 0.5` inwards, `0` from `radius + 0.5` outwards.
pub fn capsule_coverage(distance: f32, radius: f32) -> f32 {
    (0.5 - (distance - radius)).clamp(0.0, 1.0)
}

#[inline]
fn iround(v: f32) -> i32 {
    (v + 0.5) as i32
}

/// Coverage weight of the outer pixel of a midpoint-ellipse step.
#[inline]
fn step_weight(d: i64, step: i64) -> f32 {
    if step == 0 {
        return 1.0;
    }
    (d.abs() as f32 / step.abs() as f32).min(1.0)
}

/// Anti-aliased drawing onto a [`FrameBuffer`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rasterizer {
    alpha_gain: f32,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA_GAIN)
    }
}

impl Rasterizer {
    pub fn new(alpha_gain: f32) -> Self {
        Self { alpha_gain }
    }

    pub fn alpha_gain(&self) -> f32 {
        self.alpha_gain
    }

    /// Blend `color` over the pixel at `(x, y)` with coverage `alpha`.
    ///
    /// Pixels outside the buffer are left alone.
    pub fn plot_pixel(&self, buffer: &mut FrameBuffer, x: i32, y: i32, alpha: f32, color: Rgb565) {
        let Some(background) = buffer.get(x, y) else {
            return;
        };
        let alpha = (alpha * self.alpha_gain * 255.0).clamp(0.0, 255.0);
        buffer.set(x, y, alpha_blend(alpha as u8, color, background));
    }

    /// Draw a capsule of half-width `radius` from `(ax, ay)` to `(bx, by)`.
    ///
    /// Endpoints are floats so needles can move by sub-pixel amounts. Every
    /// pixel of the box `floor(min - r)..=ceil(max + r)` is sampled.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_wide_line_aa(
        &self,
        buffer: &mut FrameBuffer,
        ax: f32,
        ay: f32,
        bx: f32,
        by: f32,
        radius: f32,
        color: Rgb565,
    ) {
        let x0 = (ax.min(bx) - radius).floor() as i32;
        let x1 = (ax.max(bx) + radius).ceil() as i32;
        let y0 = (ay.min(by) - radius).floor() as i32;
        let y1 = (ay.max(by) + radius).ceil() as i32;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let distance = line_distance(x as f32, y as f32, ax, ay, bx, by);
                self.plot_pixel(buffer, x, y, capsule_coverage(distance, radius), color);
            }
        }
    }

    /// Outline of a rounded rectangle with corner radii `rx`, `ry`.
    ///
    /// `(x, y)` is the top-left corner of the bounding box of size
    /// `width` x `height`. The corners are traced with a midpoint-ellipse
    /// scan: per step, the decision variable `d` relative to the step
    /// increment gives the coverage of the outer pixel and its complement the
    /// coverage of the inner pixel, mirrored into all four quadrants.
    ///
    /// Negative radii draw nothing. `rx == 0` draws a vertical line of
    /// `2 * ry` pixels centered on `(x, y)`; `ry == 0` a horizontal line of
    /// `2 * rx` pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_round_rect_aa(
        &self,
        buffer: &mut FrameBuffer,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
    ) {
        if rx < 0 || ry < 0 {
            return;
        }
        if rx == 0 {
            buffer.vline(x, y - ry, 2 * ry, color);
            return;
        }
        if ry == 0 {
            buffer.hline(x - rx, y, 2 * rx, color);
            return;
        }

        let a2 = rx as i64 * rx as i64;
        let b2 = ry as i64 * ry as i64;
        let ds = a2 << 1;
        let dt = b2 << 1;

        let xc2 = x << 1;
        let yc2 = y << 1;

        let sab = ((a2 + b2) as f32).sqrt();
        let od = iround(sab * 0.01) + 1;
        let dxt = iround(a2 as f32 / sab) + od;
        let dyt = iround(b2 as f32 / sab) + od;

        let mut t: i64 = 0;
        let mut s: i64 = -2 * a2 * ry as i64;
        let mut d: i64 = 0;

        let mut xp = x + rx;
        let mut yp = y;

        // Straight sides between the corners
        buffer.hline(x + rx, y + height, width - 2 * rx + 1, color);
        buffer.hline(x + rx, y, width - 2 * rx + 1, color);
        buffer.vline(x + width, y + ry, height - 2 * ry + 1, color);
        buffer.vline(x, y + ry, height - 2 * ry + 1, color);

        // Flat part of the corner arcs: step x, occasionally y
        for _ in 1..=dxt {
            xp -= 1;
            d += t - b2;

            let ys;
            if d >= 0 {
                ys = yp - 1;
            } else if (d - s - a2) > 0 {
                if ((d << 1) - s - a2) >= 0 {
                    ys = yp + 1;
                } else {
                    ys = yp;
                    yp += 1;
                    d -= s + a2;
                    s += ds;
                }
            } else {
                yp += 1;
                ys = yp + 1;
                d -= s + a2;
                s += ds;
            }

            t -= dt;

            let weight = step_weight(d, s);
            let iweight = 1.0 - weight;

            // Upper half
            let xx = xc2 - xp;
            self.plot_pixel(buffer, xp, yp, iweight, color);
            self.plot_pixel(buffer, xx + width, yp, iweight, color);
            self.plot_pixel(buffer, xp, ys, weight, color);
            self.plot_pixel(buffer, xx + width, ys, weight, color);

            // Lower half
            let yy = yc2 - yp;
            self.plot_pixel(buffer, xp, yy + height, iweight, color);
            self.plot_pixel(buffer, xx + width, yy + height, iweight, color);
            let yy = yc2 - ys;
            self.plot_pixel(buffer, xp, yy + height, weight, color);
            self.plot_pixel(buffer, xx + width, yy + height, weight, color);
        }

        // Steep part of the corner arcs: step y, occasionally x
        for _ in 1..=dyt {
            yp += 1;
            d -= s + a2;

            let xs;
            if d <= 0 {
                xs = xp + 1;
            } else if (d + t - b2) < 0 {
                if ((d << 1) + t - b2) <= 0 {
                    xs = xp - 1;
                } else {
                    xs = xp;
                    xp -= 1;
                    d += t - b2;
                    t -= dt;
                }
            } else {
                xp -= 1;
                xs = xp - 1;
                d += t - b2;
                t -= dt;
            }

            s += ds;

            let weight = step_weight(d, t);
            let iweight = 1.0 - weight;

            // Left half
            let xx = xc2 - xp;
            let yy = yc2 - yp;
            self.plot_pixel(buffer, xp, yp, iweight, color);
            self.plot_pixel(buffer, xx + width, yp, iweight, color);
            self.plot_pixel(buffer, xp, yy + height, iweight, color);
            self.plot_pixel(buffer, xx + width, yy + height, iweight, color);

            // Right half
            let xx = xc2 - xs;
            self.plot_pixel(buffer, xs, yp, weight, color);
            self.plot_pixel(buffer, xx + width, yp, weight, color);
            self.plot_pixel(buffer, xs, yy + height, weight, color);
            self.plot_pixel(buffer, xx + width, yy + height, weight, color);
        }
    }

    /// Anti-aliased circle outline centered on `(cx, cy)`.
    pub fn draw_circle_aa(&self, buffer: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: Rgb565) {
        self.draw_round_rect_aa(
            buffer,
            cx - radius,
            cy - radius,
            radius << 1,
            radius << 1,
            radius,
            radius,
            color,
        );
    }

    /// Anti-aliased outline plus a solid interior.
    pub fn fill_circle_aa(&self, buffer: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: Rgb565) {
        if radius < 0 {
            return;
        }
        self.draw_circle_aa(buffer, cx, cy, radius, color);
        Circle::with_center(Point::new(cx, cy), (2 * radius + 1) as u32)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(buffer)
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    fn white_pixels(fb: &FrameBuffer) -> usize {
        fb.pixels().iter().filter(|&&p| p == Rgb565::WHITE).count()
    }

    #[test]
    fn test_line_distance_on_segment_is_zero() {
        assert!(line_distance(5.0, 5.0, 0.0, 0.0, 10.0, 10.0).abs() < 1e-6);
        assert!(line_distance(3.0, 0.0, 0.0, 0.0, 10.0, 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_distance_clamps_to_endpoints() {
        // Projection falls before `a`: distance to `a`
        let d = line_distance(-3.0, 4.0, 0.0, 0.0, 10.0, 0.0);
        assert!((d - 5.0).abs() < 1e-6);

        // Projection falls past `b`: distance to `b`
        let d = line_distance(13.0, -4.0, 0.0, 0.0, 10.0, 0.0);
        assert!((d - 5.0).abs() < 1e-6);

        // Perpendicular inside the segment
        let d = line_distance(4.0, 2.5, 0.0, 0.0, 10.0, 0.0);
        assert!((d - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_line_distance_degenerate_segment() {
        let d = line_distance(3.0, 4.0, 0.0, 0.0, 0.0, 0.0);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_capsule_coverage_band() {
        assert!((capsule_coverage(2.0, 2.0) - 0.5).abs() < 1e-6);
        assert!((capsule_coverage(1.0, 2.0) - 1.0).abs() < 1e-6);
        assert!((capsule_coverage(1.6, 2.0) - 0.9).abs() < 1e-5);
        assert!(capsule_coverage(3.0, 2.0).abs() < 1e-6);
        assert!((capsule_coverage(2.4, 2.0) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_plot_pixel_blends_and_clips() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(4, 4);

        raster.plot_pixel(&mut fb, 1, 1, 1.0, Rgb565::WHITE);
        assert_eq!(fb.get(1, 1), Some(Rgb565::WHITE));

        raster.plot_pixel(&mut fb, 2, 2, 0.0, Rgb565::WHITE);
        assert_eq!(fb.get(2, 2), Some(Rgb565::BLACK));

        // Outside the buffer: silently ignored
        raster.plot_pixel(&mut fb, -1, 2, 1.0, Rgb565::WHITE);
        raster.plot_pixel(&mut fb, 2, 40, 1.0, Rgb565::WHITE);
        assert_eq!(white_pixels(&fb), 1);
    }

    #[test]
    fn test_plot_pixel_gain_saturates() {
        let raster = Rasterizer::new(1.3);
        let mut fb = FrameBuffer::new(2, 2);
        raster.plot_pixel(&mut fb, 0, 0, 0.9, Rgb565::WHITE);
        assert_eq!(fb.get(0, 0), Some(Rgb565::WHITE));

        let plain = Rasterizer::new(1.0);
        plain.plot_pixel(&mut fb, 1, 1, 0.9, Rgb565::WHITE);
        assert_ne!(fb.get(1, 1), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_wide_line_axis_is_solid_and_far_pixels_untouched() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(32, 32);
        raster.draw_wide_line_aa(&mut fb, 5.0, 16.0, 25.0, 16.0, 2.0, Rgb565::WHITE);

        for x in 5..=25 {
            assert_eq!(fb.get(x, 16), Some(Rgb565::WHITE), "axis pixel {x}");
            assert_eq!(fb.get(x, 17), Some(Rgb565::WHITE));
        }
        // Exactly on the edge: half coverage
        let edge = fb.get(15, 18).unwrap();
        assert!(edge != Rgb565::WHITE && edge != Rgb565::BLACK);
        // Beyond r + 0.5: nothing
        assert_eq!(fb.get(15, 19), Some(Rgb565::BLACK));
        assert_eq!(fb.get(15, 13), Some(Rgb565::BLACK));
        // Round cap reaches past the endpoint
        assert_eq!(fb.get(26, 16), Some(Rgb565::WHITE));
        assert_eq!(fb.get(28, 16), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_wide_line_clips_at_buffer_edge() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(8, 8);
        raster.draw_wide_line_aa(&mut fb, -10.0, -10.0, 20.0, 20.0, 3.0, Rgb565::WHITE);
        assert_eq!(fb.get(4, 4), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_negative_radius_is_noop() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(16, 16);
        raster.draw_round_rect_aa(&mut fb, 2, 2, 8, 8, -1, 3, Rgb565::WHITE);
        raster.draw_round_rect_aa(&mut fb, 2, 2, 8, 8, 3, -1, Rgb565::WHITE);
        raster.fill_circle_aa(&mut fb, 8, 8, -4, Rgb565::WHITE);
        assert_eq!(fb.count_not(Rgb565::BLACK), 0);
    }

    #[test]
    fn test_zero_rx_draws_vertical_line() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(20, 20);
        raster.draw_round_rect_aa(&mut fb, 10, 10, 0, 0, 0, 4, Rgb565::WHITE);
        assert_eq!(white_pixels(&fb), 8);
        for y in 6..14 {
            assert_eq!(fb.get(10, y), Some(Rgb565::WHITE));
        }
    }

    #[test]
    fn test_zero_ry_draws_horizontal_line() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(20, 20);
        raster.draw_round_rect_aa(&mut fb, 10, 10, 0, 0, 5, 0, Rgb565::WHITE);
        assert_eq!(white_pixels(&fb), 10);
        for x in 5..15 {
            assert_eq!(fb.get(x, 10), Some(Rgb565::WHITE));
        }
    }

    #[test]
    fn test_circle_outline_is_symmetric() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(41, 41);
        raster.draw_circle_aa(&mut fb, 20, 20, 12, Rgb565::WHITE);

        // Cardinal points are drawn at full strength
        assert_eq!(fb.get(20, 8), Some(Rgb565::WHITE));
        assert_eq!(fb.get(20, 32), Some(Rgb565::WHITE));
        assert_eq!(fb.get(8, 20), Some(Rgb565::WHITE));
        assert_eq!(fb.get(32, 20), Some(Rgb565::WHITE));

        // Mirror symmetry about both axes through the center
        for y in 0..41 {
            for x in 0..41 {
                let p = fb.get(x, y);
                assert_eq!(p, fb.get(40 - x, y), "x-mirror at ({x},{y})");
                assert_eq!(p, fb.get(x, 40 - y), "y-mirror at ({x},{y})");
            }
        }

        // Center and far corners untouched
        assert_eq!(fb.get(20, 20), Some(Rgb565::BLACK));
        assert_eq!(fb.get(0, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_circle_outline_stays_near_radius() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(41, 41);
        raster.draw_circle_aa(&mut fb, 20, 20, 12, Rgb565::WHITE);
        for y in 0..41 {
            for x in 0..41 {
                if fb.get(x, y) != Some(Rgb565::BLACK) {
                    let r = (((x - 20) * (x - 20) + (y - 20) * (y - 20)) as f32).sqrt();
                    assert!((r - 12.0).abs() < 2.0, "pixel ({x},{y}) at radius {r}");
                }
            }
        }
    }

    #[test]
    fn test_fill_circle_covers_interior() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(30, 30);
        raster.fill_circle_aa(&mut fb, 15, 15, 10, Rgb565::WHITE);
        for y in 8..=22 {
            for x in 8..=22 {
                assert_eq!(fb.get(x, y), Some(Rgb565::WHITE), "interior ({x},{y})");
            }
        }
        assert_eq!(fb.get(0, 0), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_round_rect_draws_straight_sides() {
        let raster = Rasterizer::default();
        let mut fb = FrameBuffer::new(40, 30);
        raster.draw_round_rect_aa(&mut fb, 2, 2, 30, 20, 4, 4, Rgb565::WHITE);
        // Top and bottom edges between the corners
        for x in 6..=28 {
            assert_eq!(fb.get(x, 2), Some(Rgb565::WHITE));
            assert_eq!(fb.get(x, 22), Some(Rgb565::WHITE));
        }
        // Left and right edges
        for y in 6..=18 {
            assert_eq!(fb.get(2, y), Some(Rgb565::WHITE));
            assert_eq!(fb.get(32, y), Some(Rgb565::WHITE));
        }
        assert_eq!(fb.get(17, 12), Some(Rgb565::BLACK));
    }
}
