//! Platform surfaces the controller drives.
//!
//! The core never touches a DOM or a terminal. A host creates media
//! elements and embed players, injects scripts and moves focus. It reports
//! everything asynchronous back through
//! [`PlayerController::handle_host_event`](crate::PlayerController::handle_host_event),
//! tagged with the [`SessionId`] it was created for.

use std::fmt;

use crate::focus::FocusTarget;
use crate::media::EmbedService;
use crate::share::ShareSurface;

/// Identity of one loaded video. Every load starts a new session; host
/// messages carrying an older session are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// How a native media element must be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSource {
    pub url: String,
    pub mime_type: &'static str,
    /// Fetch metadata only until playback is requested
    pub preload_metadata: bool,
    pub plays_inline: bool,
    /// Always false: playback is started by the controller
    pub autoplay: bool,
}

impl NativeSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: "video/mp4",
            preload_metadata: true,
            plays_inline: true,
            autoplay: false,
        }
    }
}

/// Player parameters passed to an embed service.
///
/// Native chrome is disabled; every control goes through the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedParams {
    pub autoplay: bool,
    pub controls: bool,
    pub modest_branding: bool,
    pub related: bool,
    pub show_info: bool,
    pub fullscreen: bool,
    pub plays_inline: bool,
    pub keyboard: bool,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            autoplay: false,
            controls: false,
            modest_branding: true,
            related: false,
            show_info: false,
            fullscreen: false,
            plays_inline: true,
            keyboard: false,
        }
    }
}

impl EmbedParams {
    /// Player vars in the service's query-string form
    pub fn to_query_pairs(&self) -> Vec<(&'static str, u8)> {
        vec![
            ("autoplay", self.autoplay as u8),
            ("controls", self.controls as u8),
            ("modestbranding", self.modest_branding as u8),
            ("rel", self.related as u8),
            ("showinfo", self.show_info as u8),
            ("fs", self.fullscreen as u8),
            ("playsinline", self.plays_inline as u8),
            ("disablekb", (!self.keyboard) as u8),
        ]
    }
}

/// Request to construct an embed player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRequest {
    pub service: EmbedService,
    pub video_id: String,
    pub params: EmbedParams,
}

/// A directly playable media element
pub trait MediaElement {
    /// Ask the platform to start playback. The outcome arrives later as
    /// [`HostEvent::PlayResolved`].
    fn request_play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn has_ended(&self) -> bool;
    /// Position in seconds
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Duration in seconds, `None` until metadata is loaded
    fn duration(&self) -> Option<f64>;
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    /// Remove the element from the player area
    fn detach(&mut self);
}

/// A third-party player constructed through the embed service's API
pub trait EmbedPlayer {
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn stop_video(&mut self);
    fn seek_to(&mut self, seconds: f64);
    fn mute(&mut self);
    fn unmute(&mut self);
    fn is_muted(&self) -> bool;
    fn current_time(&self) -> f64;
    /// Duration in seconds, `0.0` while unknown
    fn duration(&self) -> f64;
    /// Release the player and everything it keeps alive
    fn destroy(&mut self);
}

/// Everything the controller needs from the page
pub trait PlayerHost: ShareSurface {
    fn create_media_element(&mut self, session: SessionId, source: &NativeSource) -> Box<dyn MediaElement>;
    /// Insert a script tag for `src`
    fn inject_script(&mut self, src: &str);
    fn create_embed_player(&mut self, session: SessionId, request: &EmbedRequest) -> Box<dyn EmbedPlayer>;
    /// Empty the element that hosts the video surface
    fn clear_player_area(&mut self);
    fn move_focus(&mut self, target: FocusTarget);
}

/// Native media element events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    LoadedMetadata,
    Play,
    Pause,
    Ended,
    TimeUpdate,
}

/// Embed player states, numbered like the YouTube iframe API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl EmbedState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// Embed player callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedEvent {
    Ready,
    StateChange(EmbedState),
    Error(i32),
}

/// Anything a host reports back for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Media(MediaEvent),
    Embed(EmbedEvent),
    /// Settlement of a native `request_play`; `Err` carries the platform reason
    PlayResolved(Result<(), String>),
}
