use log::{debug, error, info, warn};

use crate::catalog::VideoRecord;
use crate::error::{Result, WidgetError};
use crate::host::{EmbedEvent, EmbedParams, EmbedPlayer, EmbedRequest, EmbedState, HostEvent, PlayerHost, SessionId};
use crate::media::loader::{ApiLoader, ApiReadiness};
use crate::media::{BackendAdapter, BackendEvent, BackendKind, PlayRequest, Readiness, fraction_of};

/// Third-party services whose players are script-injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedService {
    YouTube,
    Vimeo,
}

impl EmbedService {
    /// Script that provides the service's player API
    pub fn script_src(self) -> &'static str {
        match self {
            Self::YouTube => "https://www.youtube.com/iframe_api",
            Self::Vimeo => "https://player.vimeo.com/api/player.js",
        }
    }

    /// Extract the service's video identifier from a URL
    pub fn extract_id(self, url: &str) -> Option<String> {
        match self {
            Self::YouTube => extract_youtube_id(url),
            Self::Vimeo => extract_vimeo_id(url),
        }
    }
}

/// Check if a URL points at YouTube
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Check if a URL points at Vimeo
pub fn is_vimeo_url(url: &str) -> bool {
    url.contains("vimeo.com")
}

/// Extract an 11-character YouTube video ID.
///
/// Recognizes `youtu.be/ID`, `/v/ID`, `/u/x/ID`, `/embed/ID`, `watch?v=ID`
/// and `&v=ID`. The last marker in the URL wins; the ID runs until `#`,
/// `&` or `?`.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    const MARKERS: [&str; 5] = ["youtu.be/", "v/", "embed/", "watch?v=", "&v="];

    let mut best: Option<usize> = None;
    let mut consider = |end: usize| {
        if best.is_none_or(|b| end > b) {
            best = Some(end);
        }
    };

    for marker in MARKERS {
        if let Some(pos) = url.rfind(marker) {
            consider(pos + marker.len());
        }
    }

    // u/<single word char>/
    let bytes = url.as_bytes();
    for (pos, _) in url.match_indices("u/") {
        let after = pos + 2;
        if bytes.len() > after + 1
            && (bytes[after].is_ascii_alphanumeric() || bytes[after] == b'_')
            && bytes[after + 1] == b'/'
        {
            consider(after + 2);
        }
    }

    let start = best?;
    let id: String = url[start..].chars().take_while(|c| !matches!(c, '#' | '&' | '?')).collect();
    (id.chars().count() == 11).then_some(id)
}

/// Extract a numeric Vimeo video ID from `vimeo.com/ID` or
/// `player.vimeo.com/video/ID`
pub fn extract_vimeo_id(url: &str) -> Option<String> {
    let rest = &url[url.find("vimeo.com/")? + "vimeo.com/".len()..];
    let path = rest.split(['?', '#']).next().unwrap_or_default();

    path.split('/')
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

enum EmbedSlot {
    /// Nothing loaded, or the URL had no usable ID
    Empty,
    /// Waiting for the service script to become available
    AwaitingApi { video_id: String, readiness: ApiReadiness },
    /// Player constructed, waiting for its ready callback
    Constructing(Box<dyn EmbedPlayer>),
    Ready(Box<dyn EmbedPlayer>),
}

/// Adapter over an embed service player.
///
/// The player only exists once the service API is loaded and the player has
/// fired its ready callback. It has no time events, so the controller polls
/// [`progress`](BackendAdapter::progress) while it is ready.
pub struct EmbeddedAdapter {
    loader: ApiLoader,
    session: SessionId,
    slot: EmbedSlot,
    params: EmbedParams,
    /// A play request made before ready, issued on ready
    play_deferred: bool,
    paused: bool,
}

impl EmbeddedAdapter {
    pub fn new(loader: ApiLoader) -> Self {
        Self {
            loader,
            session: SessionId::default(),
            slot: EmbedSlot::Empty,
            params: EmbedParams::default(),
            play_deferred: false,
            paused: true,
        }
    }

    pub fn service(&self) -> EmbedService {
        self.loader.service()
    }

    fn construct(&mut self, video_id: String, host: &mut dyn PlayerHost) {
        info!("Creating {:?} player for {}", self.service(), video_id);
        let request = EmbedRequest {
            service: self.service(),
            video_id,
            params: self.params,
        };
        self.slot = EmbedSlot::Constructing(host.create_embed_player(self.session, &request));
    }

    fn ready_player(&mut self) -> Option<&mut Box<dyn EmbedPlayer>> {
        match &mut self.slot {
            EmbedSlot::Ready(player) => Some(player),
            _ => None,
        }
    }

    fn ready_player_ref(&self) -> Option<&dyn EmbedPlayer> {
        match &self.slot {
            EmbedSlot::Ready(player) => Some(player.as_ref()),
            _ => None,
        }
    }

    fn destroy_player(&mut self) {
        match std::mem::replace(&mut self.slot, EmbedSlot::Empty) {
            EmbedSlot::Ready(mut player) | EmbedSlot::Constructing(mut player) => {
                player.stop_video();
                player.destroy();
            }
            EmbedSlot::AwaitingApi { .. } | EmbedSlot::Empty => {}
        }
        self.play_deferred = false;
        self.paused = true;
    }
}

impl BackendAdapter for EmbeddedAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded(self.service())
    }

    fn load(&mut self, session: SessionId, record: &VideoRecord, host: &mut dyn PlayerHost) -> Result<()> {
        self.destroy_player();
        self.session = session;

        let Some(video_id) = self.service().extract_id(&record.video_url) else {
            error!("Invalid {:?} URL: {}", self.service(), record.video_url);
            return Err(WidgetError::MalformedSource {
                url: record.video_url.clone(),
            });
        };

        self.loader.ensure_injected(|src| host.inject_script(src));

        if self.loader.is_ready() {
            self.construct(video_id, host);
        } else {
            debug!("Waiting for {:?} API before creating player", self.service());
            self.slot = EmbedSlot::AwaitingApi {
                video_id,
                readiness: self.loader.subscribe(),
            };
        }
        Ok(())
    }

    fn resume(&mut self, host: &mut dyn PlayerHost) -> bool {
        let ready = match &self.slot {
            EmbedSlot::AwaitingApi { readiness, .. } => readiness.is_ready(),
            _ => false,
        };
        if !ready {
            return false;
        }

        if let EmbedSlot::AwaitingApi { video_id, .. } = std::mem::replace(&mut self.slot, EmbedSlot::Empty) {
            self.construct(video_id, host);
        }
        true
    }

    fn readiness(&self) -> Readiness {
        match self.slot {
            EmbedSlot::Ready(_) => Readiness::Ready,
            _ => Readiness::Uninitialized,
        }
    }

    fn play(&mut self) -> PlayRequest {
        match &mut self.slot {
            EmbedSlot::Ready(player) => {
                debug!("Playing {:?} video", self.loader.service());
                player.play_video();
                PlayRequest::Issued
            }
            EmbedSlot::AwaitingApi { .. } | EmbedSlot::Constructing(_) => {
                self.play_deferred = true;
                PlayRequest::Deferred
            }
            EmbedSlot::Empty => PlayRequest::Unavailable,
        }
    }

    fn pause(&mut self) {
        self.play_deferred = false;
        if let Some(player) = self.ready_player() {
            player.pause_video();
        }
    }

    fn stop(&mut self) {
        self.play_deferred = false;
        if let Some(player) = self.ready_player() {
            player.pause_video();
            player.seek_to(0.0);
        }
    }

    fn seek(&mut self, fraction: f64) {
        let Some(player) = self.ready_player() else {
            return;
        };
        let duration = player.duration();
        if duration > 0.0 {
            let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
            player.seek_to(fraction * duration);
        }
    }

    fn toggle_mute(&mut self) -> Option<bool> {
        let player = self.ready_player()?;
        if player.is_muted() {
            player.unmute();
            Some(false)
        } else {
            player.mute();
            Some(true)
        }
    }

    fn is_muted(&self) -> bool {
        self.ready_player_ref().is_some_and(|p| p.is_muted())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn progress(&self) -> f64 {
        self.ready_player_ref()
            .map_or(0.0, |p| fraction_of(p.current_time(), Some(p.duration())))
    }

    fn polls_progress(&self) -> bool {
        true
    }

    fn translate(&mut self, event: HostEvent) -> Option<BackendEvent> {
        let HostEvent::Embed(event) = event else {
            return None;
        };

        match event {
            EmbedEvent::Ready => {
                let EmbedSlot::Constructing(_) = self.slot else {
                    return None;
                };
                if let EmbedSlot::Constructing(player) = std::mem::replace(&mut self.slot, EmbedSlot::Empty) {
                    self.slot = EmbedSlot::Ready(player);
                }
                info!("{:?} player ready", self.service());

                if std::mem::take(&mut self.play_deferred) {
                    self.play();
                }
                Some(BackendEvent::Ready)
            }
            EmbedEvent::StateChange(state) => {
                self.ready_player_ref()?;
                debug!("{:?} state: {:?}", self.service(), state);
                match state {
                    EmbedState::Playing => {
                        self.paused = false;
                        Some(BackendEvent::Playing)
                    }
                    EmbedState::Paused => {
                        self.paused = true;
                        Some(BackendEvent::Paused)
                    }
                    EmbedState::Ended => {
                        self.paused = true;
                        Some(BackendEvent::Ended)
                    }
                    EmbedState::Unstarted | EmbedState::Buffering | EmbedState::Cued => None,
                }
            }
            EmbedEvent::Error(code) => {
                warn!("{:?} player error {}", self.service(), code);
                None
            }
        }
    }

    fn teardown(&mut self) {
        self.destroy_player();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VideoType;
    use crate::testing::FakeHost;

    fn youtube(url: &str) -> VideoRecord {
        VideoRecord::new("a", VideoType::Youtube, url)
    }

    #[test]
    fn test_extract_youtube_id_variants() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ"), expected);
        assert_eq!(extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"), expected);
        assert_eq!(extract_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"), expected);
        assert_eq!(extract_youtube_id("https://www.youtube.com/v/dQw4w9WgXcQ"), expected);
        assert_eq!(extract_youtube_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"), expected);
        assert_eq!(extract_youtube_id("https://www.youtube.com/u/w/dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn test_extract_youtube_id_rejects_wrong_length() {
        assert_eq!(extract_youtube_id("https://youtu.be/short"), None);
        assert_eq!(extract_youtube_id("https://www.youtube.com/channel/UCabc"), None);
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQextra"), None);
    }

    #[test]
    fn test_extract_vimeo_id() {
        assert_eq!(extract_vimeo_id("https://vimeo.com/76979871"), Some("76979871".into()));
        assert_eq!(
            extract_vimeo_id("https://player.vimeo.com/video/76979871?h=abc"),
            Some("76979871".into())
        );
        assert_eq!(extract_vimeo_id("https://vimeo.com/channels/staffpicks"), None);
        assert_eq!(extract_vimeo_id("https://example.com/76979871"), None);
    }

    #[test]
    fn test_malformed_url_leaves_adapter_uninitialized() {
        let mut host = FakeHost::default();
        let mut adapter = EmbeddedAdapter::new(ApiLoader::new(EmbedService::YouTube));

        let err = adapter
            .load(SessionId::default().next(), &youtube("https://youtu.be/nope"), &mut host)
            .unwrap_err();
        assert!(matches!(err, WidgetError::MalformedSource { .. }));
        assert_eq!(adapter.readiness(), Readiness::Uninitialized);
        assert_eq!(adapter.play(), PlayRequest::Unavailable);
        assert!(host.scripts.is_empty());
    }

    #[test]
    fn test_construction_waits_for_api() {
        let mut host = FakeHost::default();
        let loader = ApiLoader::new(EmbedService::YouTube);
        let mut adapter = EmbeddedAdapter::new(loader.clone());

        adapter
            .load(SessionId::default().next(), &youtube("https://youtu.be/dQw4w9WgXcQ"), &mut host)
            .unwrap();
        assert_eq!(host.scripts, ["https://www.youtube.com/iframe_api"]);
        assert!(host.embeds.is_empty());
        assert!(!adapter.resume(&mut host));

        loader.mark_ready();
        assert!(adapter.resume(&mut host));
        assert_eq!(host.embeds.len(), 1);
        assert_eq!(host.last_embed().borrow().request.video_id, "dQw4w9WgXcQ");
        assert_eq!(adapter.readiness(), Readiness::Uninitialized);

        assert_eq!(
            adapter.translate(HostEvent::Embed(EmbedEvent::Ready)),
            Some(BackendEvent::Ready)
        );
        assert_eq!(adapter.readiness(), Readiness::Ready);
    }

    #[test]
    fn test_play_before_ready_is_deferred_once() {
        let mut host = FakeHost::default();
        let loader = ApiLoader::new(EmbedService::YouTube);
        loader.mark_ready();
        let mut adapter = EmbeddedAdapter::new(loader);

        adapter
            .load(SessionId::default().next(), &youtube("https://youtu.be/dQw4w9WgXcQ"), &mut host)
            .unwrap();
        assert_eq!(adapter.play(), PlayRequest::Deferred);
        assert_eq!(host.last_embed().borrow().play_calls, 0);

        adapter.translate(HostEvent::Embed(EmbedEvent::Ready));
        assert_eq!(host.last_embed().borrow().play_calls, 1);
    }

    #[test]
    fn test_state_changes_map_to_uniform_events() {
        let mut host = FakeHost::default();
        let loader = ApiLoader::new(EmbedService::Vimeo);
        loader.mark_ready();
        let mut adapter = EmbeddedAdapter::new(loader);
        let record = VideoRecord::new("v", VideoType::Vimeo, "https://vimeo.com/76979871");
        adapter.load(SessionId::default().next(), &record, &mut host).unwrap();

        // No state events before the player is ready
        let playing = HostEvent::Embed(EmbedEvent::StateChange(EmbedState::Playing));
        assert_eq!(adapter.translate(playing.clone()), None);

        adapter.translate(HostEvent::Embed(EmbedEvent::Ready));
        assert_eq!(adapter.translate(playing), Some(BackendEvent::Playing));
        assert_eq!(
            adapter.translate(HostEvent::Embed(EmbedEvent::StateChange(EmbedState::Buffering))),
            None
        );
        assert_eq!(
            adapter.translate(HostEvent::Embed(EmbedEvent::StateChange(EmbedState::Ended))),
            Some(BackendEvent::Ended)
        );
    }

    #[test]
    fn test_seek_mute_and_teardown() {
        let mut host = FakeHost::default();
        let loader = ApiLoader::new(EmbedService::YouTube);
        loader.mark_ready();
        let mut adapter = EmbeddedAdapter::new(loader);
        adapter
            .load(SessionId::default().next(), &youtube("https://youtu.be/dQw4w9WgXcQ"), &mut host)
            .unwrap();
        adapter.translate(HostEvent::Embed(EmbedEvent::Ready));
        host.last_embed().borrow_mut().duration = 200.0;

        adapter.seek(0.5);
        assert!((adapter.progress() - 0.5).abs() < 1e-9);

        assert_eq!(adapter.toggle_mute(), Some(true));
        assert!(adapter.is_muted());
        assert_eq!(adapter.toggle_mute(), Some(false));

        adapter.teardown();
        let embed = host.last_embed();
        assert!(embed.borrow().destroyed);
        assert_eq!(adapter.readiness(), Readiness::Uninitialized);
        assert_eq!(adapter.progress(), 0.0);
    }
}
