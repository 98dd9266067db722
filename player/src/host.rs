//! A stand-in page for the terminal preview.
//!
//! Media elements play on a simulated clock, embed players answer like the
//! YouTube/Vimeo APIs would, and script injection turns into a readiness
//! notification after a configurable delay. Everything asynchronous is queued
//! as `(SessionId, HostEvent)` and handed to the controller by the app.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use vpw_core::{
    EmbedApis, EmbedEvent, EmbedPlayer, EmbedRequest, EmbedService, EmbedState, FocusTarget, HostEvent, MediaElement,
    MediaEvent, NativeSource, PlayerHost, SessionId, ShareError, ShareSurface,
};

/// URL shared when a video has none
const PAGE_URL: &str = "http://localhost/video-widget-preview";

type Outbox = Rc<RefCell<Vec<(SessionId, HostEvent)>>>;

/// How the simulated page behaves
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Length of every simulated video
    pub video_duration: Duration,
    /// Refuse playback that was not started by a key press or click
    pub block_autoplay: bool,
    /// Time between injecting an embed script and its API becoming ready
    pub api_delay: Duration,
}

#[derive(Debug)]
struct SimMedia {
    session: SessionId,
    url: String,
    duration: f64,
    metadata_loaded: bool,
    position: f64,
    paused: bool,
    ended: bool,
    muted: bool,
    detached: bool,
}

struct SimMediaHandle {
    media: Rc<RefCell<SimMedia>>,
    outbox: Outbox,
    user_gesture: Rc<Cell<bool>>,
    block_autoplay: bool,
}

impl SimMediaHandle {
    fn emit(&self, event: HostEvent) {
        let session = self.media.borrow().session;
        self.outbox.borrow_mut().push((session, event));
    }
}

impl MediaElement for SimMediaHandle {
    fn request_play(&mut self) {
        if self.block_autoplay && !self.user_gesture.get() {
            debug!("Simulated autoplay policy rejected play()");
            self.emit(HostEvent::PlayResolved(Err("NotAllowedError: play() requires a user gesture".into())));
            return;
        }

        {
            let mut media = self.media.borrow_mut();
            if media.ended {
                media.position = 0.0;
                media.ended = false;
            }
            media.paused = false;
        }
        self.emit(HostEvent::PlayResolved(Ok(())));
        self.emit(HostEvent::Media(MediaEvent::Play));
    }

    fn pause(&mut self) {
        let was_playing = {
            let mut media = self.media.borrow_mut();
            !std::mem::replace(&mut media.paused, true)
        };
        if was_playing {
            self.emit(HostEvent::Media(MediaEvent::Pause));
        }
    }

    fn is_paused(&self) -> bool {
        self.media.borrow().paused
    }

    fn has_ended(&self) -> bool {
        self.media.borrow().ended
    }

    fn current_time(&self) -> f64 {
        self.media.borrow().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        {
            let mut media = self.media.borrow_mut();
            media.position = seconds.clamp(0.0, media.duration);
            media.ended = false;
        }
        self.emit(HostEvent::Media(MediaEvent::TimeUpdate));
    }

    fn duration(&self) -> Option<f64> {
        let media = self.media.borrow();
        media.metadata_loaded.then_some(media.duration)
    }

    fn muted(&self) -> bool {
        self.media.borrow().muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.media.borrow_mut().muted = muted;
    }

    fn detach(&mut self) {
        self.media.borrow_mut().detached = true;
    }
}

#[derive(Debug)]
struct SimEmbed {
    session: SessionId,
    request: EmbedRequest,
    duration: f64,
    ready_sent: bool,
    state: EmbedState,
    position: f64,
    muted: bool,
    destroyed: bool,
}

struct SimEmbedHandle {
    embed: Rc<RefCell<SimEmbed>>,
    outbox: Outbox,
}

impl SimEmbedHandle {
    fn set_state(&self, state: EmbedState) {
        let session = {
            let mut embed = self.embed.borrow_mut();
            if embed.destroyed || embed.state == state {
                return;
            }
            embed.state = state;
            embed.session
        };
        self.outbox
            .borrow_mut()
            .push((session, HostEvent::Embed(EmbedEvent::StateChange(state))));
    }
}

impl EmbedPlayer for SimEmbedHandle {
    fn play_video(&mut self) {
        {
            let mut embed = self.embed.borrow_mut();
            if embed.state == EmbedState::Ended {
                embed.position = 0.0;
            }
        }
        self.set_state(EmbedState::Playing);
    }

    fn pause_video(&mut self) {
        if self.embed.borrow().state == EmbedState::Playing {
            self.set_state(EmbedState::Paused);
        }
    }

    fn stop_video(&mut self) {
        self.embed.borrow_mut().position = 0.0;
        self.set_state(EmbedState::Unstarted);
    }

    fn seek_to(&mut self, seconds: f64) {
        let mut embed = self.embed.borrow_mut();
        embed.position = seconds.clamp(0.0, embed.duration);
    }

    fn mute(&mut self) {
        self.embed.borrow_mut().muted = true;
    }

    fn unmute(&mut self) {
        self.embed.borrow_mut().muted = false;
    }

    fn is_muted(&self) -> bool {
        self.embed.borrow().muted
    }

    fn current_time(&self) -> f64 {
        self.embed.borrow().position
    }

    fn duration(&self) -> f64 {
        self.embed.borrow().duration
    }

    fn destroy(&mut self) {
        self.embed.borrow_mut().destroyed = true;
    }
}

/// What the video surface currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Empty,
    Native { url: String, position: f64, duration: Option<f64> },
    Embedded { service: EmbedService, video_id: String, position: f64, duration: f64 },
}

pub struct SimulatedHost {
    options: HostOptions,
    apis: EmbedApis,
    clock: Duration,
    /// Injected scripts and when their API becomes ready
    scripts: Vec<(EmbedService, Duration)>,
    media: Option<Rc<RefCell<SimMedia>>>,
    embed: Option<Rc<RefCell<SimEmbed>>>,
    outbox: Outbox,
    user_gesture: Rc<Cell<bool>>,
    shared_link_path: Option<PathBuf>,
}

impl SimulatedHost {
    pub fn new(options: HostOptions, apis: EmbedApis) -> Self {
        Self {
            options,
            apis,
            clock: Duration::ZERO,
            scripts: Vec::new(),
            media: None,
            embed: None,
            outbox: Rc::new(RefCell::new(Vec::new())),
            user_gesture: Rc::new(Cell::new(false)),
            shared_link_path: dirs::cache_dir().map(|dir| dir.join("vpw").join("shared-link.txt")),
        }
    }

    /// Mark whether the calls that follow come from user input
    pub fn set_user_gesture(&self, gesture: bool) {
        self.user_gesture.set(gesture);
    }

    /// Events queued by synchronous calls since the last drain
    pub fn drain_events(&mut self) -> Vec<(SessionId, HostEvent)> {
        std::mem::take(&mut *self.outbox.borrow_mut())
    }

    pub fn surface(&self) -> Surface {
        if let Some(embed) = self.embed.as_ref().map(|e| e.borrow()).filter(|e| !e.destroyed) {
            return Surface::Embedded {
                service: embed.request.service,
                video_id: embed.request.video_id.clone(),
                position: embed.position,
                duration: embed.duration,
            };
        }
        if let Some(media) = self.media.as_ref().map(|m| m.borrow()).filter(|m| !m.detached) {
            return Surface::Native {
                url: media.url.clone(),
                position: media.position,
                duration: media.metadata_loaded.then_some(media.duration),
            };
        }
        Surface::Empty
    }

    /// Let `elapsed` pass on the simulated page and collect what happened
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(SessionId, HostEvent)> {
        self.clock += elapsed;
        let dt = elapsed.as_secs_f64();

        for (service, ready_at) in &self.scripts {
            if *ready_at <= self.clock && self.apis.loader(*service).mark_ready() {
                info!("{:?} API finished loading", service);
            }
        }

        if let Some(media) = &self.media {
            let mut media = media.borrow_mut();
            let session = media.session;
            let mut outbox = self.outbox.borrow_mut();

            if !media.detached {
                if !media.metadata_loaded {
                    media.metadata_loaded = true;
                    outbox.push((session, HostEvent::Media(MediaEvent::LoadedMetadata)));
                }
                if !media.paused && !media.ended {
                    media.position = (media.position + dt).min(media.duration);
                    outbox.push((session, HostEvent::Media(MediaEvent::TimeUpdate)));
                    if media.position >= media.duration {
                        media.ended = true;
                        media.paused = true;
                        outbox.push((session, HostEvent::Media(MediaEvent::Pause)));
                        outbox.push((session, HostEvent::Media(MediaEvent::Ended)));
                    }
                }
            }
        }

        if let Some(embed) = &self.embed {
            let mut embed = embed.borrow_mut();
            let session = embed.session;
            let mut outbox = self.outbox.borrow_mut();

            if !embed.destroyed {
                if !embed.ready_sent {
                    embed.ready_sent = true;
                    outbox.push((session, HostEvent::Embed(EmbedEvent::Ready)));
                }
                if embed.state == EmbedState::Playing {
                    embed.position = (embed.position + dt).min(embed.duration);
                    if embed.position >= embed.duration {
                        embed.state = EmbedState::Ended;
                        outbox.push((session, HostEvent::Embed(EmbedEvent::StateChange(EmbedState::Ended))));
                    }
                }
            }
        }

        self.drain_events()
    }
}

impl PlayerHost for SimulatedHost {
    fn create_media_element(&mut self, session: SessionId, source: &NativeSource) -> Box<dyn MediaElement> {
        debug!("Creating media element for {} in {}", source.url, session);
        let media = Rc::new(RefCell::new(SimMedia {
            session,
            url: source.url.clone(),
            duration: self.options.video_duration.as_secs_f64(),
            metadata_loaded: false,
            position: 0.0,
            paused: true,
            ended: false,
            muted: false,
            detached: false,
        }));
        self.media = Some(Rc::clone(&media));

        Box::new(SimMediaHandle {
            media,
            outbox: Rc::clone(&self.outbox),
            user_gesture: Rc::clone(&self.user_gesture),
            block_autoplay: self.options.block_autoplay,
        })
    }

    fn inject_script(&mut self, src: &str) {
        let service = [EmbedService::YouTube, EmbedService::Vimeo]
            .into_iter()
            .find(|s| s.script_src() == src);

        match service {
            Some(service) => {
                info!("Injecting script {}", src);
                self.scripts.push((service, self.clock + self.options.api_delay));
            }
            None => warn!("Unknown script {}", src),
        }
    }

    fn create_embed_player(&mut self, session: SessionId, request: &EmbedRequest) -> Box<dyn EmbedPlayer> {
        debug!("Creating {:?} player for {} in {}", request.service, request.video_id, session);
        let embed = Rc::new(RefCell::new(SimEmbed {
            session,
            request: request.clone(),
            duration: self.options.video_duration.as_secs_f64(),
            ready_sent: false,
            state: EmbedState::Unstarted,
            position: 0.0,
            muted: false,
            destroyed: false,
        }));
        self.embed = Some(Rc::clone(&embed));

        Box::new(SimEmbedHandle {
            embed,
            outbox: Rc::clone(&self.outbox),
        })
    }

    fn clear_player_area(&mut self) {
        self.media = None;
        self.embed = None;
    }

    fn move_focus(&mut self, target: FocusTarget) {
        // Drawing reads focus from the controller
        debug!("Focus moved to {:?}", target);
    }
}

impl ShareSurface for SimulatedHost {
    fn page_url(&self) -> String {
        PAGE_URL.to_string()
    }

    fn native_share(&mut self, _title: &str, _url: &str) -> Result<(), ShareError> {
        // Terminals have no share sheet
        Err(ShareError::Unavailable)
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ShareError> {
        // OSC 52 asks the terminal emulator to set the system clipboard
        let sequence = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
        let mut stdout = io::stdout();
        stdout
            .write_all(sequence.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ShareError::Failed(e.to_string()))
    }

    fn legacy_copy(&mut self, text: &str) -> Result<(), ShareError> {
        let path = self.shared_link_path.as_ref().ok_or(ShareError::Unavailable)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ShareError::Failed(e.to_string()))?;
        }
        fs::write(path, text).map_err(|e| ShareError::Failed(e.to_string()))?;
        info!("Link written to {}", path.display());
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        // Shown inside the modal from the controller's view
        info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(block_autoplay: bool) -> SimulatedHost {
        let options = HostOptions {
            video_duration: Duration::from_secs(2),
            block_autoplay,
            api_delay: Duration::from_millis(500),
        };
        SimulatedHost::new(options, EmbedApis::new())
    }

    #[test]
    fn test_media_plays_to_the_end() {
        let mut host = host(false);
        let session = SessionId::default().next();
        let mut element = host.create_media_element(session, &NativeSource::new("/v.mp4"));

        let events = host.advance(Duration::from_millis(10));
        assert_eq!(events, [(session, HostEvent::Media(MediaEvent::LoadedMetadata))]);

        element.request_play();
        assert_eq!(
            host.drain_events(),
            [
                (session, HostEvent::PlayResolved(Ok(()))),
                (session, HostEvent::Media(MediaEvent::Play))
            ]
        );

        let events = host.advance(Duration::from_secs(3));
        assert!(events.contains(&(session, HostEvent::Media(MediaEvent::Ended))));
        assert!(element.has_ended());
    }

    #[test]
    fn test_autoplay_policy_requires_gesture() {
        let mut host = host(true);
        let session = SessionId::default().next();
        let mut element = host.create_media_element(session, &NativeSource::new("/v.mp4"));

        element.request_play();
        assert!(matches!(host.drain_events()[..], [(_, HostEvent::PlayResolved(Err(_)))]));

        host.set_user_gesture(true);
        element.request_play();
        assert!(!element.is_paused());
    }

    #[test]
    fn test_embed_api_becomes_ready_after_delay() {
        let mut host = host(false);
        let apis = host.apis.clone();
        host.inject_script(EmbedService::YouTube.script_src());

        host.advance(Duration::from_millis(499));
        assert!(!apis.loader(EmbedService::YouTube).is_ready());
        host.advance(Duration::from_millis(1));
        assert!(apis.loader(EmbedService::YouTube).is_ready());
    }
}
