use crate::audio::spectrum::BIN_COUNT;
use crate::core::PlayerCore;
use crate::disc::DiscWidget;
use crate::theme::{Rgb, Theme};
use image::RgbaImage;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Clear, Gauge, Paragraph, Wrap};

const BACKDROP: Rgb = Rgb(8, 8, 12);
const MUTED: Rgb = Rgb(113, 113, 122);

/// Per-frame keep factor; the complement is the low-opacity fill that fades
/// the previous frame instead of clearing it.
const TRAIL_FADE: f32 = 0.78;

const EIGHTHS: [char; 8] = ['\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}'];

/// Accumulated bar intensities, one slot per frequency bin. Keyed by bin
/// rather than by screen column so a resize never resets the trail.
#[derive(Debug)]
pub struct Trail {
    values: [f32; BIN_COUNT],
}

impl Trail {
    pub fn new() -> Self {
        Self {
            values: [0.0; BIN_COUNT],
        }
    }

    pub fn fade(&mut self) {
        for value in &mut self.values {
            *value *= TRAIL_FADE;
            if *value < 1.0 {
                *value = 0.0;
            }
        }
    }

    pub fn merge(&mut self, bins: &[u8; BIN_COUNT]) {
        for (value, &bin) in self.values.iter_mut().zip(bins) {
            *value = value.max(f32::from(bin));
        }
    }

    pub fn values(&self) -> &[f32; BIN_COUNT] {
        &self.values
    }

    pub fn is_dark(&self) -> bool {
        self.values.iter().all(|&value| value == 0.0)
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Visuals<'a> {
    pub trail: &'a Trail,
    pub cover: Option<&'a RgbaImage>,
    pub angle: f32,
}

pub fn draw(frame: &mut Frame, core: &PlayerCore, visuals: &Visuals, command_line: Option<&str>) {
    let area = frame.area();
    let theme = &core.theme;
    frame.render_widget(
        Block::default().style(Style::default().bg(BACKDROP.color())),
        area,
    );

    // The visualizer surface spans the full width and the bottom half of the
    // viewport; chrome and disc paint over it, matching the stacking order.
    let viz_height = area.height / 2;
    let viz = Rect::new(
        area.x,
        area.y + area.height - viz_height,
        area.width,
        viz_height,
    );
    frame.render_widget(
        SpectrumBars {
            trail: visuals.trail,
            theme,
        },
        viz,
    );

    let chunks = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);

    let stage = chunks[1];
    if stage.height >= 4 && stage.width >= 8 {
        let disc_height = stage.height.min(stage.width / 2);
        let disc_width = (disc_height * 2).min(stage.width);
        let disc = Rect::new(
            stage.x + (stage.width - disc_width) / 2,
            stage.y + (stage.height - disc_height) / 2,
            disc_width,
            disc_height,
        );
        frame.render_widget(
            DiscWidget::new(visuals.cover, theme, core.is_playing, visuals.angle),
            disc,
        );
    }

    if !core.hide_ui {
        draw_header(frame, core, chunks[0]);
        draw_progress(frame, core, chunks[2]);
        draw_help(frame, chunks[3]);
        frame.render_widget(
            Paragraph::new(core.status.as_str()).style(Style::default().fg(MUTED.color())),
            chunks[4],
        );
    }

    if let Some(buffer) = command_line {
        frame.render_widget(
            Paragraph::new(format!(":{buffer}"))
                .style(Style::default().fg(theme.accent.color()).bg(BACKDROP.color())),
            chunks[4],
        );
    }

    if let Some(notice) = &core.notice {
        draw_notice(frame, theme, notice, area);
    }
}

fn draw_header(frame: &mut Frame, core: &PlayerCore, area: Rect) {
    let theme = &core.theme;
    let dot_color = if core.is_playing {
        theme.primary.color()
    } else {
        MUTED.color()
    };

    let mut lines = Vec::with_capacity(3);
    if core.track.artist.is_empty() {
        lines.push(Line::default());
    } else {
        lines.push(Line::from(Span::styled(
            core.track.artist.to_uppercase(),
            Style::default()
                .fg(theme.primary.color())
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        core.track.title.to_uppercase(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    )));
    lines.push(Line::from(vec![
        Span::styled("\u{25cf} ", Style::default().fg(dot_color)),
        Span::styled(
            "NEONSPIN // SYSTEM READY",
            Style::default().fg(MUTED.color()),
        ),
        Span::styled(" \u{25cf}", Style::default().fg(dot_color)),
    ]));

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().bg(theme.gradient.0.scale(0.35).color())),
        area,
    );
}

fn draw_progress(frame: &mut Frame, core: &PlayerCore, area: Rect) {
    let theme = &core.theme;
    let ratio = if core.duration_seconds > 0.0 {
        (core.position_seconds / core.duration_seconds).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let label = format!(
        "{} / {}",
        format_time(core.position_seconds),
        format_time(core.duration_seconds)
    );

    let gauge = Gauge::default()
        .block(
            Block::bordered()
                .border_style(Style::default().fg(theme.secondary.color()))
                .title(Span::styled(
                    " playback ",
                    Style::default().fg(theme.accent.color()),
                )),
        )
        .gauge_style(
            Style::default()
                .fg(theme.primary.color())
                .bg(theme.gradient.1.scale(0.6).color()),
        )
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(vec![
        Span::styled("space", Style::default().fg(Color::White)),
        Span::styled(" play/pause  ", Style::default().fg(MUTED.color())),
        Span::styled("\u{2190}/\u{2192}", Style::default().fg(Color::White)),
        Span::styled(" seek  ", Style::default().fg(MUTED.color())),
        Span::styled("n", Style::default().fg(Color::White)),
        Span::styled(" next  ", Style::default().fg(MUTED.color())),
        Span::styled("h", Style::default().fg(Color::White)),
        Span::styled(" hide ui  ", Style::default().fg(MUTED.color())),
        Span::styled(":open", Style::default().fg(Color::White)),
        Span::styled(" file/playlist  ", Style::default().fg(MUTED.color())),
        Span::styled("q", Style::default().fg(Color::White)),
        Span::styled(" quit", Style::default().fg(MUTED.color())),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

fn draw_notice(frame: &mut Frame, theme: &Theme, notice: &str, area: Rect) {
    let width = (area.width * 3 / 5).clamp(20, 64).min(area.width);
    let height = area.height.min(5);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(notice)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(BACKDROP.color()))
            .block(
                Block::bordered()
                    .border_style(Style::default().fg(theme.primary.color()))
                    .title(" notice ")
                    .title_bottom(" any key to dismiss "),
            ),
        popup,
    );
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

struct SpectrumBars<'a> {
    trail: &'a Trail,
    theme: &'a Theme,
}

impl Widget for SpectrumBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let bar_width = ((f32::from(area.width) / BIN_COUNT as f32) * 2.5).max(1.0) as u16;
        let height_scale = if area.height < 14 { 0.8 } else { 1.4 };
        let bottom = area.y + area.height - 1;

        let mut x = 0_u16;
        for bin in 0..BIN_COUNT {
            if x >= area.width {
                break;
            }

            let level = (self.trail.values()[bin] / 255.0 * height_scale).min(1.0);
            let eighths = (level * f32::from(area.height) * 8.0).round() as u32;
            let full_rows = (eighths / 8) as u16;
            let remainder = (eighths % 8) as usize;
            let bar_rows = f32::from(full_rows.max(1));

            for col in 0..bar_width {
                let cell_x = area.x + x + col;
                if cell_x >= area.x + area.width {
                    break;
                }

                for row in 0..full_rows {
                    let color = self
                        .theme
                        .secondary
                        .lerp(self.theme.primary, f32::from(row) / bar_rows);
                    buf[(cell_x, bottom - row)]
                        .set_char('\u{2588}')
                        .set_fg(color.color());
                }

                if remainder > 0 && full_rows < area.height {
                    buf[(cell_x, bottom - full_rows)]
                        .set_char(EIGHTHS[remainder - 1])
                        .set_fg(self.theme.primary.color());
                }

                // Soft glow above the tip in the primary color.
                let glow_row = full_rows + u16::from(remainder > 0);
                if full_rows > 0 && glow_row < area.height {
                    buf[(cell_x, bottom - glow_row)]
                        .set_char('\u{2591}')
                        .set_fg(self.theme.glow.scale(0.5).color());
                }
            }

            x += bar_width + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::THEMES;

    #[test]
    fn trail_fades_toward_zero() {
        let mut trail = Trail::new();
        trail.merge(&[200; BIN_COUNT]);

        let before = trail.values()[0];
        trail.fade();
        let after = trail.values()[0];
        assert!(after < before);

        for _ in 0..60 {
            trail.fade();
        }
        assert!(trail.is_dark(), "repeated fades should clear to black");
    }

    #[test]
    fn merge_keeps_the_louder_of_old_and_new() {
        let mut trail = Trail::new();
        trail.merge(&[100; BIN_COUNT]);
        trail.fade();

        let mut bins = [0_u8; BIN_COUNT];
        bins[0] = 255;
        trail.merge(&bins);

        assert_eq!(trail.values()[0], 255.0);
        assert!(trail.values()[1] > 0.0, "faded value survives a quiet bin");
    }

    #[test]
    fn bars_render_for_a_loud_trail() {
        let mut trail = Trail::new();
        trail.merge(&[255; BIN_COUNT]);

        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        SpectrumBars {
            trail: &trail,
            theme: &THEMES[0],
        }
        .render(area, &mut buf);

        let painted = area
            .positions()
            .filter(|pos| buf[(pos.x, pos.y)].symbol() != " ")
            .count();
        assert!(painted > 100, "a loud spectrum should fill many cells");
    }

    #[test]
    fn dark_trail_paints_nothing() {
        let trail = Trail::new();
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        SpectrumBars {
            trail: &trail,
            theme: &THEMES[0],
        }
        .render(area, &mut buf);

        assert!(
            area.positions()
                .all(|pos| buf[(pos.x, pos.y)].symbol() == " ")
        );
    }

    #[test]
    fn time_formats_as_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.4), "1:05");
        assert_eq!(format_time(-2.0), "0:00");
    }
}
