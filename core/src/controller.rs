//! The modal player state machine.
//!
//! `Closed → Loading → Ready → Playing ⇄ Paused → Ended → (replay) Playing`,
//! and any open phase back to `Closed` on close.
//!
//! Every delayed action is a [`Timeline`] timer tied to the session of the
//! video that scheduled it, and every host message carries the session it was
//! created for. Loading a video starts a new session, so nothing from an
//! older video can reach the current one.


use std::time::Duration;

use log::{debug, error, info, warn};

use crate::catalog::{VideoCatalog, VideoRecord};
use crate::config::WidgetConfig;
use crate::error::WidgetError;
use crate::focus::{FocusTarget, FocusTrap, ModalControl};
use crate::host::{HostEvent, PlayerHost, SessionId};
use crate::media::{
    BackendAdapter, BackendEvent, BackendKind, EmbedApis, PlayRequest, Readiness, create_backend, detect_backend,
};
use crate::share::{COPIED_NOTICE, ShareOutcome, share_link};
use crate::style::ButtonStyles;
use crate::timers::{Fired, TimerKind, Timeline};
use crate::view::{ActiveBackend, ModalKey, ModalTarget, ModalView, Phase, PlayerState, Signal};

pub struct PlayerController<H: PlayerHost> {
    host: H,
    config: WidgetConfig,
    catalog: VideoCatalog,
    apis: EmbedApis,
    backend: Option<Box<dyn BackendAdapter>>,
    session: SessionId,
    timeline: Timeline,
    focus: FocusTrap,
    styles: ButtonStyles,
    phase: Phase,
    current_index: usize,
    is_playing: bool,
    is_muted: bool,
    view: ModalView,
    signals: Vec<Signal>,
}

impl<H: PlayerHost> PlayerController<H> {
    /// Mount the widget from its serialized data attribute.
    ///
    /// A missing, malformed or empty catalog is logged and leaves the widget
    /// unmounted.
    pub fn mount(host: H, config: WidgetConfig, data_attribute: Option<&str>, apis: EmbedApis) -> Option<Self> {
        let Some(data) = data_attribute else {
            error!("No videos found");
            return None;
        };

        match VideoCatalog::from_data_attribute(data) {
            Ok(catalog) => Some(Self::new(host, config, catalog, apis)),
            Err(e) => {
                error!("No videos found: {}", e);
                None
            }
        }
    }

    pub fn new(mut host: H, config: WidgetConfig, catalog: VideoCatalog, apis: EmbedApis) -> Self {
        info!("Mounting video widget with {} videos", catalog.len());

        // Scripts load while the modal is still closed
        for record in catalog.iter() {
            if let BackendKind::Embedded(service) = detect_backend(record) {
                apis.loader(service).ensure_injected(|src| host.inject_script(src));
            }
        }

        let first = catalog.first();
        let view = ModalView {
            title: first.title.clone(),
            subtitle: first.cta_text.clone(),
            ..ModalView::default()
        };

        Self {
            focus: FocusTrap::new(catalog.len()),
            styles: ButtonStyles::from_catalog(&catalog),
            host,
            config,
            catalog,
            apis,
            backend: None,
            session: SessionId::default(),
            timeline: Timeline::new(),
            phase: Phase::Closed,
            current_index: 0,
            is_playing: false,
            is_muted: false,
            view,
            signals: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn catalog(&self) -> &VideoCatalog {
        &self.catalog
    }

    pub fn current_record(&self) -> Option<&VideoRecord> {
        self.catalog.get(self.current_index)
    }

    pub fn view(&self) -> &ModalView {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn button_styles(&self) -> &ButtonStyles {
        &self.styles
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            is_open: self.phase.is_open(),
            current_index: self.current_index,
            is_playing: self.is_playing,
            is_muted: self.is_muted,
            active_backend: self.backend.as_ref().map(|b| match b.kind() {
                BackendKind::Native => ActiveBackend::Native,
                BackendKind::Embedded(service) => ActiveBackend::Embedded {
                    service,
                    ready: b.readiness() == Readiness::Ready,
                },
            }),
            actions_visible: self.view.buttons_visible,
        }
    }

    /// Where keyboard focus should be
    pub fn focus(&self) -> FocusTarget {
        self.focus.current().map_or(FocusTarget::Trigger, FocusTarget::Control)
    }

    /// Timers still scheduled, of any kind
    pub fn pending_timers(&self) -> usize {
        self.timeline.pending()
    }

    pub fn has_pending(&self, kind: TimerKind) -> bool {
        self.timeline.is_pending(kind)
    }

    pub fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    /// Open the modal on the first video
    pub fn open(&mut self) {
        if self.phase.is_open() {
            return;
        }
        info!("Opening modal");

        self.phase = Phase::Loading;
        // Hidden up front so it does not flash before autoplay
        self.view.play_overlay_visible = false;
        self.view.notice = None;
        self.show_actions();
        self.view.toggle_shown = true;

        self.load(0);
        self.timeline
            .schedule(TimerKind::Autoplay, self.session, self.config.timings.open_autoplay_delay());

        let first = self.focus.activate();
        self.host.move_focus(FocusTarget::Control(first));
        self.emit(Signal::Opened);
    }

    /// Close the modal, releasing the backend and every timer
    pub fn close(&mut self) {
        if !self.phase.is_open() {
            return;
        }
        info!("Closing modal");

        self.teardown_backend();
        self.timeline.cancel_all();
        // Late host messages for the closed video must not match anything
        self.session = self.session.next();

        self.phase = Phase::Closed;
        self.is_playing = false;
        self.view.play_overlay_visible = true;
        self.view.replay_visible = false;
        self.view.subtitle_visible = false;
        self.view.progress = 0.0;
        self.view.notice = None;
        self.show_actions();
        self.view.toggle_shown = false;
        self.view.toggle_expanded = false;

        self.focus.release();
        self.host.move_focus(FocusTarget::Trigger);
        self.emit(Signal::Closed);
    }

    /// Page unload: nothing may survive this
    pub fn shutdown(&mut self) {
        self.close();
        self.teardown_backend();
        self.timeline.cancel_all();
        debug!("Widget shut down");
    }

    /// Switch to the video at `index`. Returns false when the switch is not
    /// possible: modal closed, single-video catalog or index out of range.
    pub fn switch_video(&mut self, index: usize) -> bool {
        if !self.phase.is_open() || !self.catalog.has_switcher() {
            return false;
        }
        if let Err(e) = self.catalog.record(index) {
            debug!("Ignoring switch: {}", e);
            return false;
        }

        info!("Switching to video: {}", index);
        self.load(index);
        self.timeline
            .schedule(TimerKind::Autoplay, self.session, self.config.timings.switch_autoplay_delay());
        true
    }

    /// Replace whatever is loaded with the record at `index`
    fn load(&mut self, index: usize) {
        let Some(record) = self.catalog.get(index).cloned() else {
            return;
        };

        self.teardown_backend();
        self.session = self.session.next();
        self.current_index = index;
        debug!("Loading video {} in {}", index, self.session);

        self.phase = Phase::Loading;
        self.is_playing = false;
        self.is_muted = false;
        self.view.muted = false;
        self.view.progress = 0.0;
        self.view.replay_visible = false;
        self.view.subtitle_visible = false;
        self.view.active_button = index;
        self.view.title = record.title.clone();
        self.view.subtitle = record.cta_text.clone();

        let kind = detect_backend(&record);
        let mut backend = create_backend(kind, &self.apis);
        match backend.load(self.session, &record, &mut self.host) {
            Ok(()) => self.emit(Signal::VideoLoaded { index, backend: kind }),
            Err(e) => {
                warn!("Video {} failed to load: {}", index, e);
                self.emit(Signal::SourceRejected { index });
            }
        }
        self.backend = Some(backend);
    }

    /// Stop and drop the backend together with its session's timers
    fn teardown_backend(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.stop();
            backend.teardown();
            self.host.clear_player_area();
        }
        self.timeline.cancel_session(self.session);
        self.is_playing = false;
    }

    pub fn play(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        match backend.play() {
            PlayRequest::Issued => self.view.play_overlay_visible = false,
            PlayRequest::Pending => {}
            PlayRequest::Deferred => debug!("Play deferred until the player is ready"),
            PlayRequest::Unavailable => debug!("Nothing loaded to play"),
        }
    }

    pub fn pause(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            backend.pause();
            self.is_playing = false;
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Rewind and play again
    pub fn replay(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        info!("Replay video");

        self.view.replay_visible = false;
        backend.stop();
        self.play();
    }

    pub fn seek(&mut self, fraction: f64) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        backend.seek(fraction);
        let progress = backend.progress();
        self.set_progress(progress);
    }

    pub fn toggle_mute(&mut self) {
        let Some(muted) = self.backend.as_mut().and_then(|b| b.toggle_mute()) else {
            return;
        };

        self.is_muted = muted;
        self.view.muted = muted;
        self.emit(Signal::MuteChanged(muted));
    }

    pub fn toggle_actions(&mut self) {
        if self.view.buttons_visible {
            self.hide_actions();
        } else {
            self.show_actions();
        }
        let visible = self.view.buttons_visible;
        self.emit(Signal::ActionsVisibility(visible));
    }

    fn show_actions(&mut self) {
        self.view.buttons_visible = true;
        self.view.toggle_expanded = true;
    }

    fn hide_actions(&mut self) {
        self.view.buttons_visible = false;
        self.view.toggle_expanded = false;
    }

    /// Share the current video's link, or the page's when it has none
    pub fn share(&mut self) {
        let url = self.current_record().map(|r| r.video_url.clone()).unwrap_or_default();
        let outcome = share_link(&mut self.host, &url);

        if matches!(outcome, ShareOutcome::Copied | ShareOutcome::CopiedLegacy) {
            self.view.notice = Some(COPIED_NOTICE.to_string());
        }
        self.emit(Signal::ShareCompleted(outcome));
    }

    /// Pointer entering (`Some`) or leaving (`None`) a switch button
    pub fn hover_button(&mut self, index: Option<usize>) {
        let id = index.and_then(|i| self.catalog.get(i)).map(|r| r.id.clone());
        self.styles.set_hovered(id.as_deref());
    }

    pub fn dismiss_notice(&mut self) {
        self.view.notice = None;
    }

    pub fn click(&mut self, target: ModalTarget) {
        match target {
            ModalTarget::Trigger | ModalTarget::Cta => return self.open(),
            _ if !self.phase.is_open() => return,
            _ => {}
        }

        if let Some(control) = control_of(target) {
            self.focus.focus(control);
        }

        match target {
            ModalTarget::CloseButton | ModalTarget::Backdrop => self.close(),
            ModalTarget::MuteButton => self.toggle_mute(),
            ModalTarget::ShareButton => self.share(),
            ModalTarget::PlayOverlay => self.play(),
            ModalTarget::ReplayOverlay => self.replay(),
            ModalTarget::ToggleActions => self.toggle_actions(),
            ModalTarget::VideoButton(index) => {
                self.switch_video(index);
            }
            ModalTarget::VideoSurface => self.toggle_play_pause(),
            ModalTarget::ProgressBar(fraction) => self.seek(fraction),
            ModalTarget::Trigger | ModalTarget::Cta => {}
        }
    }

    pub fn handle_key(&mut self, key: ModalKey) {
        if !self.phase.is_open() {
            // Focus rests on the trigger while closed
            if matches!(key, ModalKey::Enter | ModalKey::Space) {
                self.open();
            }
            return;
        }

        match key {
            ModalKey::Escape => self.close(),
            ModalKey::Tab => {
                let view = &self.view;
                if let Some(control) = self.focus.next(|c| control_shown(view, c)) {
                    self.host.move_focus(FocusTarget::Control(control));
                }
            }
            ModalKey::BackTab => {
                let view = &self.view;
                if let Some(control) = self.focus.previous(|c| control_shown(view, c)) {
                    self.host.move_focus(FocusTarget::Control(control));
                }
            }
            ModalKey::Enter | ModalKey::Space => {
                match self.focus.current() {
                    Some(control) if control_shown(&self.view, control) => self.click(target_of(control)),
                    Some(control) => debug!("Ignoring activation of hidden {:?}", control),
                    None => {}
                }
            }
        }
    }

    /// Deliver an asynchronous host message. Messages from any session but
    /// the current one are stale and dropped.
    pub fn handle_host_event(&mut self, session: SessionId, event: HostEvent) {
        if session != self.session {
            debug!("Ignoring stale event from {}: {:?}", session, event);
            return;
        }

        let Some(event) = self.backend.as_mut().and_then(|b| b.translate(event)) else {
            return;
        };
        self.on_backend_event(event);
    }

    fn on_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ready => {
                if self.phase == Phase::Loading {
                    self.phase = Phase::Ready;
                }
                if self.backend.as_ref().is_some_and(|b| b.polls_progress()) {
                    self.start_polling();
                }
            }
            BackendEvent::Playing => {
                self.is_playing = true;
                self.phase = Phase::Playing;
                self.view.play_overlay_visible = false;
                self.view.replay_visible = false;

                // Ended stops the poll; any route back to playing restarts it
                let polls = self
                    .backend
                    .as_ref()
                    .is_some_and(|b| b.polls_progress() && b.readiness() == Readiness::Ready);
                if polls && !self.timeline.is_pending(TimerKind::ProgressPoll) {
                    self.start_polling();
                }

                let timings = self.config.timings;
                self.timeline.cancel_kind(TimerKind::AutoHideActions);
                self.timeline
                    .schedule(TimerKind::AutoHideActions, self.session, timings.auto_hide_delay());

                self.view.subtitle_visible = true;
                self.timeline.cancel_kind(TimerKind::SubtitleReveal);
                self.timeline
                    .schedule(TimerKind::SubtitleReveal, self.session, timings.subtitle_duration());

                self.emit(Signal::Playing);
                self.emit(Signal::SubtitleVisibility(true));
            }
            BackendEvent::Paused => {
                self.is_playing = false;
                self.phase = Phase::Paused;
                self.view.play_overlay_visible = true;
                self.emit(Signal::Paused);
            }
            BackendEvent::Ended => {
                info!("Video ended");
                self.is_playing = false;
                self.phase = Phase::Ended;
                self.view.replay_visible = true;
                self.show_actions();
                self.view.toggle_shown = false;
                self.timeline.cancel_kind(TimerKind::AutoHideActions);
                self.timeline.cancel_kind(TimerKind::ProgressPoll);
                self.emit(Signal::Ended);
                self.emit(Signal::ActionsVisibility(true));
            }
            BackendEvent::Progress(fraction) => self.set_progress(fraction),
            BackendEvent::PlayConfirmed => {
                self.view.play_overlay_visible = false;
            }
            BackendEvent::PlayRejected(reason) => {
                info!("Autoplay prevented, {}", WidgetError::PlaybackBlocked(reason));
                self.is_playing = false;
                if self.phase != Phase::Ended {
                    self.phase = Phase::Paused;
                }
                self.view.play_overlay_visible = true;
                self.emit(Signal::PlaybackBlocked);
            }
        }
    }

    fn set_progress(&mut self, fraction: f64) {
        if (self.view.progress - fraction).abs() > f64::EPSILON {
            self.view.progress = fraction;
            self.emit(Signal::Progress(fraction));
        }
    }

    fn start_polling(&mut self) {
        self.timeline.cancel_kind(TimerKind::ProgressPoll);
        self.timeline.schedule_repeating(
            TimerKind::ProgressPoll,
            self.session,
            self.config.timings.progress_poll_interval(),
        );
    }

    /// Let `elapsed` pass: finish deferred backend setup, then fire every
    /// timer that falls due, in order.
    pub fn advance(&mut self, elapsed: Duration) {
        if let Some(backend) = self.backend.as_mut() {
            if backend.resume(&mut self.host) {
                debug!("Backend initialization resumed in {}", self.session);
            }
        }

        let until = self.timeline.now() + elapsed;
        while let Some(fired) = self.timeline.pop_due(until) {
            self.fire(fired);
        }
    }

    fn fire(&mut self, fired: Fired) {
        if fired.session != self.session {
            debug!("Dropping {:?} timer from {}", fired.kind, fired.session);
            self.timeline.cancel(fired.handle);
            return;
        }

        match fired.kind {
            TimerKind::Autoplay => {
                if self.phase.is_open() {
                    debug!("Autoplay attempt");
                    self.play();
                }
            }
            TimerKind::ProgressPoll => {
                if let Some(progress) = self
                    .backend
                    .as_ref()
                    .filter(|b| b.readiness() == Readiness::Ready)
                    .map(|b| b.progress())
                {
                    self.set_progress(progress);
                }
            }
            TimerKind::AutoHideActions => {
                if self.is_playing {
                    debug!("Hiding actions after delay");
                    self.hide_actions();
                    self.view.toggle_shown = true;
                    self.emit(Signal::ActionsVisibility(false));
                }
            }
            TimerKind::SubtitleReveal => {
                self.view.subtitle_visible = false;
                self.emit(Signal::SubtitleVisibility(false));
            }
        }
    }
}

fn control_of(target: ModalTarget) -> Option<ModalControl> {
    match target {
        ModalTarget::CloseButton => Some(ModalControl::Close),
        ModalTarget::MuteButton => Some(ModalControl::Mute),
        ModalTarget::ShareButton => Some(ModalControl::Share),
        ModalTarget::ToggleActions => Some(ModalControl::ToggleActions),
        ModalTarget::VideoButton(index) => Some(ModalControl::VideoButton(index)),
        _ => None,
    }
}

fn target_of(control: ModalControl) -> ModalTarget {
    match control {
        ModalControl::Close => ModalTarget::CloseButton,
        ModalControl::Mute => ModalTarget::MuteButton,
        ModalControl::Share => ModalTarget::ShareButton,
        ModalControl::VideoButton(index) => ModalTarget::VideoButton(index),
        ModalControl::ToggleActions => ModalTarget::ToggleActions,
    }
}

/// Whether a focusable control is currently on screen
fn control_shown(view: &ModalView, control: ModalControl) -> bool {
    match control {
        ModalControl::VideoButton(_) => view.buttons_visible,
        ModalControl::ToggleActions => view.toggle_shown,
        ModalControl::Close | ModalControl::Mute | ModalControl::Share => true,
    }
}
