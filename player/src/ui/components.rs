use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use vpw_core::HexColor;

pub fn rgb(color: HexColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Format seconds as MM:SS, or HH:MM:SS past an hour
pub fn format_duration(duration: f64) -> String {
    let total_seconds = duration.max(0.0).round() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Thin progress strip along the top of the modal
pub struct ProgressBar {
    fraction: f64,
    accent: Color,
    label: Option<String>,
}

impl ProgressBar {
    pub fn new(fraction: f64, accent: Color) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            accent,
            label: None,
        }
    }

    /// Show `position / duration` inside the bar
    pub fn times(mut self, position: f64, duration: Option<f64>) -> Self {
        self.label = Some(match duration {
            Some(duration) => format!("{} / {}", format_duration(position), format_duration(duration)),
            None => format_duration(position),
        });
        self
    }
}

impl Widget for ProgressBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.accent).bg(Color::DarkGray))
            .ratio(self.fraction)
            .label(self.label.unwrap_or_default());

        gauge.render(area, buf);
    }
}

/// Display a status message with fade effect
pub struct StatusMessage<'a> {
    message: &'a str,
    color: Color,
    age: Duration,
    max_age: Duration,
}

impl<'a> StatusMessage<'a> {
    pub fn new(message: &'a str, color: Color, age: Duration) -> Self {
        Self {
            message,
            color,
            age,
            max_age: Duration::from_secs(3),
        }
    }

    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = duration;
        self
    }
}

impl Widget for StatusMessage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.age >= self.max_age {
            return;
        }
        let fade_factor = 1.0 - (self.age.as_secs_f32() / self.max_age.as_secs_f32());

        let color = match (self.color, fade_factor) {
            // Errors stay red
            (Color::Red, _) => Color::Red,
            (_, f) if f > 0.3 => self.color,
            _ => Color::DarkGray,
        };

        let text = Paragraph::new(Text::from(self.message))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .style(Style::default().bg(Color::Black)),
            );

        let message_width = (self.message.width() as u16 + 4).min(area.width);
        let message_area = Rect {
            x: area.x + (area.width.saturating_sub(message_width)) / 2,
            y: area.y + area.height.saturating_sub(4),
            width: message_width,
            height: 3.min(area.height),
        };

        Clear.render(message_area, buf);
        text.render(message_area, buf);
    }
}

/// Keyboard reference shown over everything else
pub struct HelpOverlay;

impl HelpOverlay {
    fn entry(key: &'static str, action: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:<10}", key), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(action),
        ])
    }
}

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let heading = |text: &'static str| {
            Line::from(Span::styled(
                text,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ))
        };

        let lines = vec![
            heading("Widget"),
            Self::entry("Enter / o", "Open the video modal"),
            Self::entry("q", "Quit (while closed)"),
            Line::from(""),
            heading("Modal"),
            Self::entry("Esc", "Close"),
            Self::entry("Tab", "Next control"),
            Self::entry("Shift+Tab", "Previous control"),
            Self::entry("Enter", "Activate focused control"),
            Self::entry("Space", "Activate focused control"),
            Self::entry("p", "Play or pause"),
            Self::entry("m", "Mute or unmute"),
            Self::entry("s", "Share the video link"),
            Self::entry("r", "Replay"),
            Self::entry("t", "Show or hide the action buttons"),
            Self::entry("1-9", "Switch video"),
            Self::entry("←/→", "Seek 10%"),
            Line::from(""),
            Self::entry("F1 / h", "Toggle this help"),
            Self::entry("Ctrl+C", "Quit"),
        ];

        let help = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Help").borders(Borders::ALL))
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false });

        Clear.render(area, buf);
        help.render(area, buf);
    }
}

/// Get a spinner frame for loading animations
pub fn get_spinner_frame(elapsed_ms: u128) -> &'static str {
    const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"];
    let frame_idx = (elapsed_ms / 80) % SPINNER_FRAMES.len() as u128;
    SPINNER_FRAMES[frame_idx as usize]
}
