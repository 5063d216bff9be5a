use crate::theme::{Rgb, Theme};
use image::RgbaImage;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use std::f32::consts::TAU;

// 33 1/3 RPM in radians per second.
const SPIN_SPEED: f32 = 3.49;

const LABEL_RATIO: f32 = 0.33;
const SPINDLE_RATIO: f32 = 0.04;
const GROOVE_COUNT: f32 = 9.0;
const GLOW_RATIO: f32 = 1.15;

const VINYL_BLACK: Rgb = Rgb(24, 24, 27);
const VINYL_GROOVE: Rgb = Rgb(39, 39, 42);
const SPINDLE: Rgb = Rgb(9, 9, 11);

/// Advances only while playing, so pausing freezes the artwork mid-turn.
#[derive(Debug, Clone, Copy)]
pub struct DiscSpin {
    angle: f32,
}

impl DiscSpin {
    pub fn new() -> Self {
        Self { angle: 0.0 }
    }

    pub fn advance(&mut self, dt_seconds: f32, spinning: bool) {
        if spinning && dt_seconds > 0.0 {
            self.angle = (self.angle + SPIN_SPEED * dt_seconds).rem_euclid(TAU);
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Default for DiscSpin {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the record as half-block pixel pairs: cover art sampled through
/// the current rotation, groove rings, center label, spindle, and a glow
/// halo while playing.
pub struct DiscWidget<'a> {
    cover: Option<&'a RgbaImage>,
    theme: &'a Theme,
    playing: bool,
    angle: f32,
}

impl<'a> DiscWidget<'a> {
    pub fn new(cover: Option<&'a RgbaImage>, theme: &'a Theme, playing: bool, angle: f32) -> Self {
        Self {
            cover,
            theme,
            playing,
            angle,
        }
    }

    fn pixel(&self, dx: f32, dy: f32) -> Option<Rgb> {
        let radius = (dx * dx + dy * dy).sqrt();

        if radius > 1.0 {
            if self.playing && radius <= GLOW_RATIO {
                let falloff = (GLOW_RATIO - radius) / (GLOW_RATIO - 1.0);
                return Some(self.theme.glow.scale(0.35 * falloff));
            }
            return None;
        }

        if radius < SPINDLE_RATIO {
            return Some(SPINDLE);
        }

        if radius < LABEL_RATIO {
            let local = radius / LABEL_RATIO;
            if local > 0.9 {
                return Some(VINYL_BLACK);
            }
            return Some(self.theme.secondary.scale(1.0 - local));
        }

        let grooved = ((radius * GROOVE_COUNT).fract()) < 0.14;
        if let Some(cover) = self.cover {
            let (sin, cos) = self.angle.sin_cos();
            let sx = dx * cos + dy * sin;
            let sy = -dx * sin + dy * cos;
            let color = sample_cover(cover, sx, sy);
            return Some(if grooved { color.scale(0.72) } else { color });
        }

        let base = if grooved { VINYL_GROOVE } else { VINYL_BLACK };
        // A faint sheen sweeping with the rotation keeps the spin visible on
        // bare vinyl.
        let pixel_angle = dy.atan2(dx).rem_euclid(TAU);
        let offset = (pixel_angle - self.angle).rem_euclid(TAU);
        if offset < 0.25 && radius > 0.45 {
            return Some(base.lerp(self.theme.secondary, 0.3));
        }
        Some(base)
    }
}

fn sample_cover(cover: &RgbaImage, sx: f32, sy: f32) -> Rgb {
    let side = cover.width().min(cover.height()).max(1);
    let offset_x = (cover.width() - side) / 2;
    let offset_y = (cover.height() - side) / 2;

    let u = ((sx * 0.5 + 0.5) * (side - 1) as f32).clamp(0.0, (side - 1) as f32);
    let v = ((sy * 0.5 + 0.5) * (side - 1) as f32).clamp(0.0, (side - 1) as f32);
    let pixel = cover.get_pixel(offset_x + u as u32, offset_y + v as u32);
    Rgb(pixel[0], pixel[1], pixel[2])
}

impl Widget for DiscWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height < 2 {
            return;
        }

        let px_width = area.width as f32;
        let px_height = (area.height * 2) as f32;
        let center_x = px_width / 2.0;
        let center_y = px_height / 2.0;
        let radius = (px_width.min(px_height) / 2.0 - 1.0).max(1.0) / GLOW_RATIO;

        for cell_y in 0..area.height {
            for cell_x in 0..area.width {
                let top = self.pixel(
                    (cell_x as f32 + 0.5 - center_x) / radius,
                    ((cell_y * 2) as f32 + 0.5 - center_y) / radius,
                );
                let bottom = self.pixel(
                    (cell_x as f32 + 0.5 - center_x) / radius,
                    ((cell_y * 2 + 1) as f32 + 0.5 - center_y) / radius,
                );

                let cell = &mut buf[(area.x + cell_x, area.y + cell_y)];
                match (top, bottom) {
                    (Some(top), Some(bottom)) => {
                        cell.set_char('\u{2580}')
                            .set_fg(top.color())
                            .set_bg(bottom.color());
                    }
                    (Some(top), None) => {
                        cell.set_char('\u{2580}').set_fg(top.color());
                    }
                    (None, Some(bottom)) => {
                        cell.set_char('\u{2584}').set_fg(bottom.color());
                    }
                    (None, None) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::THEMES;

    #[test]
    fn spin_advances_only_while_playing() {
        let mut spin = DiscSpin::new();
        spin.advance(0.5, false);
        assert_eq!(spin.angle(), 0.0);

        spin.advance(0.5, true);
        assert!(spin.angle() > 0.0);
    }

    #[test]
    fn spin_angle_wraps_within_a_turn() {
        let mut spin = DiscSpin::new();
        for _ in 0..100 {
            spin.advance(0.25, true);
        }
        assert!(spin.angle() >= 0.0 && spin.angle() < TAU);
    }

    #[test]
    fn widget_renders_disc_pixels_into_the_buffer() {
        let theme = &THEMES[0];
        let widget = DiscWidget::new(None, theme, true, 0.0);
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);

        widget.render(area, &mut buf);

        let painted = area
            .positions()
            .filter(|pos| buf[(pos.x, pos.y)].symbol() != " ")
            .count();
        assert!(painted > 0, "disc should paint something");
    }

    #[test]
    fn tiny_areas_render_nothing() {
        let theme = &THEMES[0];
        let widget = DiscWidget::new(None, theme, false, 0.0);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        assert!(
            area.positions()
                .all(|pos| buf[(pos.x, pos.y)].symbol() == " ")
        );
    }
}
