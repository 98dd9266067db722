use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info};
use ratatui::{layout::Rect, style::Color};
use vpw_core::{ModalKey, ModalTarget, PlayerController, ShareOutcome, Signal};

use crate::host::SimulatedHost;

/// Rounds of host-event delivery per tick. Handling an event may make the
/// controller call into the host again, which can queue further events.
const MAX_FLUSH_ROUNDS: usize = 8;
/// Fraction of the video skipped by the arrow keys
const SEEK_STEP: f64 = 0.1;
/// How long the share confirmation stays on screen
const NOTICE_DURATION: Duration = Duration::from_secs(2);

pub struct App {
    pub controller: PlayerController<SimulatedHost>,
    /// Status message to display
    pub status_message: Option<(String, Instant, Color)>,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Help dialog visibility
    pub show_help: bool,
    /// Clickable regions from the last draw, later entries on top
    pub hitboxes: Vec<(Rect, ModalTarget)>,
    /// Where the modal was drawn, `None` while closed
    pub modal_area: Option<Rect>,
    notice_since: Option<Instant>,
    started: Instant,
}

impl App {
    pub fn new(controller: PlayerController<SimulatedHost>) -> Self {
        Self {
            controller,
            status_message: None,
            should_quit: false,
            show_help: false,
            hitboxes: Vec::new(),
            modal_area: None,
            notice_since: None,
            started: Instant::now(),
        }
    }

    /// Time since startup, for animations
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Set a status message with a color
    pub fn set_status(&mut self, message: impl Into<String>, color: Color) {
        let message = message.into();
        debug!("Status message: {} ({})", message, color);
        self.status_message = Some((message, Instant::now(), color));
    }

    /// Let `elapsed` pass on the page and in the controller
    pub fn tick(&mut self, elapsed: Duration) {
        let events = self.controller.host_mut().advance(elapsed);
        for (session, event) in events {
            self.controller.handle_host_event(session, event);
        }
        self.controller.advance(elapsed);
        self.settle();

        if let Some(since) = self.notice_since {
            if since.elapsed() >= NOTICE_DURATION {
                self.controller.dismiss_notice();
                self.notice_since = None;
            }
        }

        if let Some((_, time, _)) = &self.status_message {
            if time.elapsed() > Duration::from_secs(5) {
                self.status_message = None;
            }
        }
    }

    /// Deliver queued host events, then react to the controller's signals
    fn settle(&mut self) {
        for _ in 0..MAX_FLUSH_ROUNDS {
            let events = self.controller.host_mut().drain_events();
            if events.is_empty() {
                break;
            }
            for (session, event) in events {
                self.controller.handle_host_event(session, event);
            }
        }

        for signal in self.controller.drain_signals() {
            self.on_signal(signal);
        }
    }

    fn on_signal(&mut self, signal: Signal) {
        debug!("Signal: {:?}", signal);
        match signal {
            Signal::SourceRejected { index } => {
                self.set_status(format!("Video {} could not be loaded", index + 1), Color::Red);
            }
            Signal::PlaybackBlocked => {
                self.set_status("Autoplay blocked. Press p to play", Color::Yellow);
            }
            Signal::ShareCompleted(outcome) => match outcome {
                ShareOutcome::Shared => self.set_status("Shared", Color::Green),
                ShareOutcome::Copied | ShareOutcome::CopiedLegacy => {
                    self.notice_since = Some(Instant::now());
                }
                ShareOutcome::Cancelled => {}
                ShareOutcome::Failed(reason) => self.set_status(format!("Share failed: {}", reason), Color::Red),
            },
            Signal::Ended => info!("Playback finished"),
            _ => {}
        }
    }

    /// Run `action` as a direct user interaction
    fn with_gesture(&mut self, action: impl FnOnce(&mut PlayerController<SimulatedHost>)) {
        self.controller.host().set_user_gesture(true);
        action(&mut self.controller);
        self.settle();
        self.controller.host().set_user_gesture(false);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::F(1) | KeyCode::Char('h') => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            _ => {}
        }

        if self.controller.phase().is_open() {
            self.handle_modal_key(key);
        } else {
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('o') => {
                    self.with_gesture(|c| c.handle_key(ModalKey::Enter));
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.with_gesture(|c| c.handle_key(ModalKey::Escape)),
            KeyCode::Tab => self.with_gesture(|c| c.handle_key(ModalKey::Tab)),
            KeyCode::BackTab => self.with_gesture(|c| c.handle_key(ModalKey::BackTab)),
            KeyCode::Enter => self.with_gesture(|c| c.handle_key(ModalKey::Enter)),
            KeyCode::Char(' ') => self.with_gesture(|c| c.handle_key(ModalKey::Space)),
            KeyCode::Char('p') => self.with_gesture(|c| c.toggle_play_pause()),
            KeyCode::Char('m') => self.with_gesture(|c| c.toggle_mute()),
            KeyCode::Char('s') => self.with_gesture(|c| c.share()),
            KeyCode::Char('r') => self.with_gesture(|c| c.replay()),
            KeyCode::Char('t') => self.with_gesture(|c| c.toggle_actions()),
            KeyCode::Left | KeyCode::Right => {
                let step = if key.code == KeyCode::Left { -SEEK_STEP } else { SEEK_STEP };
                let target = (self.controller.view().progress + step).clamp(0.0, 1.0);
                self.with_gesture(|c| c.seek(target));
            }
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                let mut switched = false;
                self.with_gesture(|c| switched = c.switch_video(index));
                if !switched {
                    debug!("No video {} to switch to", index + 1);
                }
            }
            _ => {}
        }
    }

    /// What sits under the terminal cell at (`column`, `row`)
    pub fn target_at(&self, column: u16, row: u16) -> Option<ModalTarget> {
        let hit = self.hitboxes.iter().rev().find(|(rect, _)| contains(rect, column, row));

        match hit {
            Some((rect, ModalTarget::ProgressBar(_))) => {
                let fraction = f64::from(column - rect.x) / f64::from(rect.width.max(1));
                Some(ModalTarget::ProgressBar(fraction.clamp(0.0, 1.0)))
            }
            Some((_, target)) => Some(*target),
            None => match self.modal_area {
                Some(modal) if !contains(&modal, column, row) => Some(ModalTarget::Backdrop),
                _ => None,
            },
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.show_help {
                    self.show_help = false;
                    return;
                }
                if let Some(target) = self.target_at(mouse.column, mouse.row) {
                    debug!("Click on {:?}", target);
                    self.with_gesture(|c| c.click(target));
                }
            }
            MouseEventKind::Moved => {
                let hovered = match self.target_at(mouse.column, mouse.row) {
                    Some(ModalTarget::VideoButton(index)) => Some(index),
                    _ => None,
                };
                self.controller.hover_button(hovered);
            }
            _ => {}
        }
    }

    /// Release everything before the terminal is restored
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        self.settle();
    }
}

fn contains(rect: &Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostOptions;
    use vpw_core::{EmbedApis, Phase, VideoCatalog, VideoRecord, VideoType, WidgetConfig};

    fn app(records: Vec<VideoRecord>, block_autoplay: bool) -> App {
        let options = HostOptions {
            video_duration: Duration::from_secs(10),
            block_autoplay,
            api_delay: Duration::from_millis(200),
        };
        let apis = EmbedApis::new();
        let host = SimulatedHost::new(options, apis.clone());
        let catalog = VideoCatalog::new(records).unwrap();
        App::new(PlayerController::new(host, WidgetConfig::default(), catalog, apis))
    }

    fn uploads(count: usize) -> Vec<VideoRecord> {
        (0..count)
            .map(|i| VideoRecord::new(format!("v{}", i), VideoType::Upload, format!("/media/{}.mp4", i)))
            .collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_enter_opens_and_autoplay_starts() {
        let mut app = app(uploads(2), false);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.controller.phase(), Phase::Loading);

        app.tick(Duration::from_millis(350));
        assert_eq!(app.controller.phase(), Phase::Playing);
    }

    #[test]
    fn test_blocked_autoplay_waits_for_key() {
        let mut app = app(uploads(1), true);
        press(&mut app, KeyCode::Enter);
        app.tick(Duration::from_millis(350));

        assert_eq!(app.controller.phase(), Phase::Paused);
        assert!(app.controller.view().play_overlay_visible);
        assert!(app.status_message.is_some());

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.controller.phase(), Phase::Playing);
    }

    #[test]
    fn test_digit_switches_video() {
        let mut app = app(uploads(3), false);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('3'));

        assert_eq!(app.controller.state().current_index, 2);
        assert_eq!(app.controller.view().active_button, 2);
    }

    #[test]
    fn test_youtube_plays_once_api_loads() {
        let record = VideoRecord::new("yt", VideoType::Youtube, "https://youtu.be/dQw4w9WgXcQ");
        let mut app = app(vec![record], false);
        press(&mut app, KeyCode::Enter);

        for _ in 0..20 {
            app.tick(Duration::from_millis(50));
        }
        assert_eq!(app.controller.phase(), Phase::Playing);
    }

    #[test]
    fn test_click_outside_modal_closes() {
        let mut app = app(uploads(1), false);
        press(&mut app, KeyCode::Enter);
        app.modal_area = Some(Rect::new(10, 2, 20, 20));

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        app.handle_mouse_event(click);
        assert_eq!(app.controller.phase(), Phase::Closed);
    }

    #[test]
    fn test_progress_bar_hit_gives_fraction() {
        let mut app = app(uploads(1), false);
        app.hitboxes.push((Rect::new(10, 1, 20, 1), ModalTarget::ProgressBar(0.0)));

        assert_eq!(app.target_at(15, 1), Some(ModalTarget::ProgressBar(0.25)));
        assert_eq!(app.target_at(15, 2), None);
    }

    #[test]
    fn test_q_quits_only_while_closed() {
        let mut app = app(uploads(1), false);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
