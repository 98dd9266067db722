use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;
use vpw_core::{EmbedService, FocusTarget, ModalControl, ModalTarget, Phase, WidgetPosition};

use super::components::{ProgressBar, get_spinner_frame, rgb};
use crate::app::App;
use crate::host::Surface;

/// Terminal cells are roughly 8x16 pixels
const PX_PER_COLUMN: u32 = 8;
const PX_PER_ROW: u32 = 16;

const SURFACE_BG: Color = Color::Rgb(17, 17, 17);

fn cells(px: u32, per_cell: u32) -> u16 {
    u16::try_from(px / per_cell).unwrap_or(u16::MAX)
}

/// Helper function to create a centered rect using up certain percentage of the available rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Rect of `width` x `height` centered in `area`
fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn control_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

/// The host page the widget is embedded in
pub fn draw_page(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled("Storefront preview", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("The video widget sits in the corner of this page."),
        Line::from("Press Enter or click it to open the player. F1 lists every key."),
    ];

    let page = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" vpw-player "))
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });

    f.render_widget(page, area);
}

/// Floating trigger with the first video's cover and CTA
pub fn draw_trigger(f: &mut Frame, app: &mut App, area: Rect) {
    let controller = &app.controller;
    let config = controller.config();
    let first = controller.catalog().first();
    let accent = rgb(config.primary_color);
    let closed = !controller.phase().is_open();
    let focused = closed && controller.focus() == FocusTarget::Trigger;

    let width = cells(config.widget_size, PX_PER_COLUMN).max(8).min(area.width);
    let height = cells(config.widget_size, PX_PER_ROW).max(3).min(area.height);
    let x = match config.position {
        WidgetPosition::BottomLeft => area.x + 1,
        WidgetPosition::BottomRight => area.right().saturating_sub(width + 1),
    };
    let y = area.bottom().saturating_sub(height + 1);
    let trigger = Rect::new(x, y, width, height);

    let cover = first
        .cover_image
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("video");

    let border_type = if focused { BorderType::Double } else { BorderType::Rounded };
    let body = Paragraph::new(vec![
        Line::from(Span::styled("▶", Style::default().fg(accent).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(cover.to_string(), Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(Style::default().fg(accent)),
    );

    f.render_widget(Clear, trigger);
    f.render_widget(body, trigger);

    let mut hitboxes = vec![(trigger, ModalTarget::Trigger)];

    let cta = first.cta_text.trim();
    if !cta.is_empty() && trigger.y >= 3 {
        let cta_width = (cta.width() as u16 + 4).min(area.width);
        let cta_x = match config.position {
            WidgetPosition::BottomLeft => trigger.x,
            WidgetPosition::BottomRight => trigger.right().saturating_sub(cta_width),
        };
        let cta_area = Rect::new(cta_x, trigger.y - 3, cta_width, 3);

        let bubble = Paragraph::new(cta.to_string())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Black).bg(accent))
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
        f.render_widget(Clear, cta_area);
        f.render_widget(bubble, cta_area);
        hitboxes.push((cta_area, ModalTarget::Cta));
    }

    // The trigger is covered by the backdrop while the modal is open
    if closed {
        app.hitboxes.extend(hitboxes);
    }
}

/// Backdrop and modal with every control
pub fn draw_modal(f: &mut Frame, app: &mut App, area: Rect) {
    let controller = &app.controller;
    let config = controller.config();
    let catalog = controller.catalog();
    let view = controller.view();
    let phase = controller.phase();
    let accent = rgb(config.primary_color);
    let focus = match controller.focus() {
        FocusTarget::Control(control) => Some(control),
        FocusTarget::Trigger => None,
    };

    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let modal = centered(
        cells(config.modal_width, PX_PER_COLUMN),
        cells(config.modal_height, PX_PER_ROW),
        area,
    );
    f.render_widget(Clear, modal);
    let frame = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent));
    let inner = frame.inner(modal);
    f.render_widget(frame, modal);

    let show_buttons = view.buttons_visible && catalog.has_switcher();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(if show_buttons { 3 } else { 0 }),
            Constraint::Length(if view.toggle_shown { 1 } else { 0 }),
        ])
        .split(inner);

    let mut hitboxes = Vec::new();
    let surface = controller.host().surface();

    let (position, duration) = match &surface {
        Surface::Native { position, duration, .. } => (*position, *duration),
        Surface::Embedded { position, duration, .. } => (*position, (*duration > 0.0).then_some(*duration)),
        Surface::Empty => (0.0, None),
    };
    f.render_widget(ProgressBar::new(view.progress, accent).times(position, duration), rows[0]);
    hitboxes.push((rows[0], ModalTarget::ProgressBar(0.0)));

    // Title and the three header controls
    let header = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
    ])
    .split(rows[1]);

    let title = Paragraph::new(Span::styled(view.title.clone(), Style::default().add_modifier(Modifier::BOLD)));
    f.render_widget(title, header[0]);

    let controls = [
        (ModalControl::Mute, if view.muted { "🔇" } else { "🔊" }, ModalTarget::MuteButton),
        (ModalControl::Share, "⇪", ModalTarget::ShareButton),
        (ModalControl::Close, "✕", ModalTarget::CloseButton),
    ];
    for ((control, icon, target), rect) in controls.into_iter().zip(header.iter().skip(1)) {
        let button = Paragraph::new(icon)
            .alignment(Alignment::Center)
            .style(control_style(focus == Some(control)));
        f.render_widget(button, *rect);
        hitboxes.push((*rect, target));
    }

    // Video surface
    let surface_area = rows[2];
    let mut lines = match &surface {
        Surface::Empty if phase == Phase::Loading => {
            vec![Line::from(format!("{} Loading", get_spinner_frame(app.uptime().as_millis())))]
        }
        Surface::Empty => vec![Line::from("No video")],
        Surface::Native { url, .. } => vec![Line::from(format!("▶ {}", url))],
        Surface::Embedded { service, video_id, .. } => {
            let name = match service {
                EmbedService::YouTube => "YouTube",
                EmbedService::Vimeo => "Vimeo",
            };
            vec![Line::from(format!("{} · {}", name, video_id))]
        }
    };
    let state = match phase {
        Phase::Closed => "",
        Phase::Loading => "loading",
        Phase::Ready => "ready",
        Phase::Playing => "playing",
        Phase::Paused => "paused",
        Phase::Ended => "ended",
    };
    lines.push(Line::from(Span::styled(state, Style::default().fg(Color::DarkGray))));
    if let Some(notice) = &view.notice {
        lines.push(Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Green))));
    }

    let video = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray).bg(SURFACE_BG))
        .wrap(Wrap { trim: true });
    f.render_widget(video, surface_area);
    hitboxes.push((surface_area, ModalTarget::VideoSurface));

    if view.subtitle_visible && !view.subtitle.is_empty() && surface_area.height > 1 {
        let line = Rect::new(surface_area.x, surface_area.bottom() - 1, surface_area.width, 1);
        let subtitle = Paragraph::new(view.subtitle.clone())
            .alignment(Alignment::Center)
            .style(Style::default().fg(accent).bg(SURFACE_BG).add_modifier(Modifier::ITALIC));
        f.render_widget(subtitle, line);
    }

    let overlay = if view.replay_visible {
        Some(("↻ Replay", ModalTarget::ReplayOverlay))
    } else if view.play_overlay_visible {
        Some(("▶ Play", ModalTarget::PlayOverlay))
    } else {
        None
    };
    if let Some((label, target)) = overlay {
        let rect = centered(12, 3, surface_area);
        let button = Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(SURFACE_BG).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(accent)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(button, rect);
        hitboxes.push((rect, target));
    }

    // Switch buttons, colored per video
    if show_buttons {
        let count = catalog.len() as u32;
        let columns = Layout::horizontal((0..count).map(|_| Constraint::Ratio(1, count))).split(rows[3]);
        let styles = controller.button_styles();

        for ((index, record), rect) in catalog.iter().enumerate().zip(columns.iter()) {
            let mut style = match styles.colors(&record.id) {
                Some(pair) => Style::default().fg(rgb(pair.text)).bg(rgb(pair.background)),
                None => Style::default(),
            };
            if index == view.active_button {
                style = style.add_modifier(Modifier::BOLD);
            }
            if focus == Some(ModalControl::VideoButton(index)) {
                style = style.add_modifier(Modifier::REVERSED);
            }

            let border_type = if index == view.active_button { BorderType::Thick } else { BorderType::Rounded };
            let button = Paragraph::new(record.button_label(index))
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_type(border_type));
            f.render_widget(button, *rect);
            hitboxes.push((*rect, ModalTarget::VideoButton(index)));
        }
    }

    if view.toggle_shown {
        let label = if view.toggle_expanded { "▾ hide actions" } else { "▴ show actions" };
        let toggle = Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(control_style(focus == Some(ModalControl::ToggleActions)));
        f.render_widget(toggle, rows[4]);
        hitboxes.push((rows[4], ModalTarget::ToggleActions));
    }

    app.modal_area = Some(modal);
    app.hitboxes.extend(hitboxes);
}
