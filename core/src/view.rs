//! What the controller exposes to whoever renders the modal.

use crate::media::{BackendKind, EmbedService};
use crate::share::ShareOutcome;

/// Lifecycle phase of the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Closed,
    /// A video is loading and its backend has not reported ready yet
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}

impl Phase {
    pub fn is_open(self) -> bool {
        self != Self::Closed
    }
}

/// Backend currently driving the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveBackend {
    Native,
    Embedded { service: EmbedService, ready: bool },
}

/// Snapshot of the controller's model
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub is_open: bool,
    pub current_index: usize,
    pub is_playing: bool,
    pub is_muted: bool,
    pub active_backend: Option<ActiveBackend>,
    pub actions_visible: bool,
}

/// Everything visible in the modal besides the video surface itself
#[derive(Debug, Clone, PartialEq)]
pub struct ModalView {
    pub play_overlay_visible: bool,
    pub replay_visible: bool,
    pub subtitle_visible: bool,
    /// Progress bar fill in `[0, 1]`
    pub progress: f64,
    pub title: String,
    pub subtitle: String,
    /// Sound-off icon shown instead of sound-on
    pub muted: bool,
    /// Switch buttons shown
    pub buttons_visible: bool,
    /// Actions toggle rendered at all
    pub toggle_shown: bool,
    /// Actions toggle in its expanded orientation
    pub toggle_expanded: bool,
    /// Highlighted switch button
    pub active_button: usize,
    /// Transient confirmation, e.g. after copying a link
    pub notice: Option<String>,
}

impl Default for ModalView {
    fn default() -> Self {
        Self {
            play_overlay_visible: true,
            replay_visible: false,
            subtitle_visible: false,
            progress: 0.0,
            title: String::new(),
            subtitle: String::new(),
            muted: false,
            buttons_visible: true,
            toggle_shown: false,
            toggle_expanded: false,
            active_button: 0,
            notice: None,
        }
    }
}

/// DOM-agnostic notifications, drained by the host after each call
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Opened,
    Closed,
    VideoLoaded { index: usize, backend: BackendKind },
    /// The record's source could not be loaded; the modal stays usable
    SourceRejected { index: usize },
    Playing,
    Paused,
    Progress(f64),
    Ended,
    MuteChanged(bool),
    ActionsVisibility(bool),
    SubtitleVisibility(bool),
    /// The platform refused to start playback
    PlaybackBlocked,
    ShareCompleted(ShareOutcome),
}

/// Something the user can click
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModalTarget {
    Trigger,
    Cta,
    CloseButton,
    MuteButton,
    ShareButton,
    PlayOverlay,
    ReplayOverlay,
    ToggleActions,
    VideoButton(usize),
    VideoSurface,
    /// Click on the progress bar at a fraction of its width
    ProgressBar(f64),
    /// The dimmed area around the modal
    Backdrop,
}

/// Keys the modal reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Escape,
    Tab,
    BackTab,
    Enter,
    Space,
}
