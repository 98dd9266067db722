mod embedded;
mod loader;
mod native;

pub use embedded::{EmbedService, EmbeddedAdapter, extract_vimeo_id, extract_youtube_id, is_vimeo_url, is_youtube_url};
pub use loader::{ApiLoader, ApiReadiness, EmbedApis};
pub use native::NativeAdapter;

use crate::catalog::{VideoRecord, VideoType};
use crate::error::Result;
use crate::host::{HostEvent, PlayerHost, SessionId};

/// Which adapter plays a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Directly playable media resource
    Native,
    /// Script-injected third-party player
    Embedded(EmbedService),
}

/// Pick the adapter for a record.
///
/// YouTube is recognized from the URL regardless of the declared type. Vimeo
/// is embedded when either declared or recognized from the URL. Everything
/// else is played natively.
pub fn detect_backend(record: &VideoRecord) -> BackendKind {
    let url = record.video_url.as_str();

    if is_youtube_url(url) {
        return BackendKind::Embedded(EmbedService::YouTube);
    }

    if record.video_type == VideoType::Vimeo || is_vimeo_url(url) {
        return BackendKind::Embedded(EmbedService::Vimeo);
    }

    BackendKind::Native
}

/// Build a fresh, unloaded adapter for `kind`
pub fn create_backend(kind: BackendKind, apis: &EmbedApis) -> Box<dyn BackendAdapter> {
    match kind {
        BackendKind::Native => Box::new(NativeAdapter::new()),
        BackendKind::Embedded(service) => Box::new(EmbeddedAdapter::new(apis.loader(service).clone())),
    }
}

/// Outcome of asking an adapter to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRequest {
    /// Playback command issued synchronously
    Issued,
    /// The platform will settle the request later
    Pending,
    /// Held until the backend becomes ready
    Deferred,
    /// Nothing loaded that could play
    Unavailable,
}

/// Uniform events produced by every adapter
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Ready,
    Playing,
    Paused,
    Ended,
    /// Position as a fraction of duration
    Progress(f64),
    PlayConfirmed,
    PlayRejected(String),
}

/// Initialization state of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
}

/// Common control surface over native and embedded playback
pub trait BackendAdapter {
    fn kind(&self) -> BackendKind;

    /// Load `record` for `session`, replacing anything previously loaded
    fn load(&mut self, session: SessionId, record: &VideoRecord, host: &mut dyn PlayerHost) -> Result<()>;

    /// Continue deferred initialization. Returns true when it made progress.
    fn resume(&mut self, _host: &mut dyn PlayerHost) -> bool {
        false
    }

    fn readiness(&self) -> Readiness;

    fn play(&mut self) -> PlayRequest;
    fn pause(&mut self);

    /// Pause and rewind to the start
    fn stop(&mut self);

    /// Seek to a fraction of the duration, clamped to `[0, 1]`
    fn seek(&mut self, fraction: f64);

    /// Flip mute. Returns the new state, `None` when nothing is loaded.
    fn toggle_mute(&mut self) -> Option<bool>;

    fn is_muted(&self) -> bool;
    fn is_paused(&self) -> bool;

    /// Position as a fraction of duration; `0.0` while the duration is unknown
    fn progress(&self) -> f64;

    /// Whether progress has to be polled rather than pushed by events
    fn polls_progress(&self) -> bool;

    /// Map a host event onto the uniform event surface
    fn translate(&mut self, event: HostEvent) -> Option<BackendEvent>;

    /// Release everything: the element or player must not emit afterwards
    fn teardown(&mut self);
}

/// `position / duration` clamped to `[0, 1]`, or `0.0` for unknown durations
pub(crate) fn fraction_of(position: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => (position / d).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(video_type: VideoType, url: &str) -> VideoRecord {
        VideoRecord::new("v", video_type, url)
    }

    #[test]
    fn test_detect_youtube_by_url_regardless_of_type() {
        let r = record(VideoType::Upload, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(detect_backend(&r), BackendKind::Embedded(EmbedService::YouTube));

        let r = record(VideoType::Vimeo, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(detect_backend(&r), BackendKind::Embedded(EmbedService::YouTube));
    }

    #[test]
    fn test_detect_vimeo_by_type_or_url() {
        let r = record(VideoType::Vimeo, "https://example.com/page");
        assert_eq!(detect_backend(&r), BackendKind::Embedded(EmbedService::Vimeo));

        let r = record(VideoType::Upload, "https://vimeo.com/76979871");
        assert_eq!(detect_backend(&r), BackendKind::Embedded(EmbedService::Vimeo));
    }

    #[test]
    fn test_detect_native_fallbacks() {
        assert_eq!(detect_backend(&record(VideoType::Upload, "/media/v.mp4")), BackendKind::Native);
        // A declared YouTube entry without a YouTube URL is played directly
        assert_eq!(
            detect_backend(&record(VideoType::Youtube, "https://cdn.example.com/v.mp4")),
            BackendKind::Native
        );
    }

    #[test]
    fn test_fraction_of_unknown_duration() {
        assert_eq!(fraction_of(5.0, None), 0.0);
        assert_eq!(fraction_of(5.0, Some(f64::NAN)), 0.0);
        assert_eq!(fraction_of(5.0, Some(0.0)), 0.0);
        assert_eq!(fraction_of(5.0, Some(10.0)), 0.5);
        assert_eq!(fraction_of(50.0, Some(10.0)), 1.0);
    }
}
