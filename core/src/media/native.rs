use log::{debug, info};

use crate::catalog::VideoRecord;
use crate::error::Result;
use crate::host::{HostEvent, MediaElement, MediaEvent, NativeSource, PlayerHost, SessionId};
use crate::media::{BackendAdapter, BackendEvent, BackendKind, PlayRequest, Readiness, fraction_of};

/// Adapter over a directly playable media element.
///
/// Progress is pushed by the element's `timeupdate` events; nothing is polled.
#[derive(Default)]
pub struct NativeAdapter {
    element: Option<Box<dyn MediaElement>>,
}

impl NativeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn release_element(&mut self) {
        if let Some(mut element) = self.element.take() {
            element.pause();
            element.detach();
        }
    }
}

impl BackendAdapter for NativeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn load(&mut self, session: SessionId, record: &VideoRecord, host: &mut dyn PlayerHost) -> Result<()> {
        info!("Loading native video: {}", record.video_url);

        // A load always replaces the element; it never reuses the old one
        self.release_element();
        let source = NativeSource::new(record.video_url.clone());
        self.element = Some(host.create_media_element(session, &source));
        Ok(())
    }

    fn readiness(&self) -> Readiness {
        if self.element.is_some() {
            Readiness::Ready
        } else {
            Readiness::Uninitialized
        }
    }

    fn play(&mut self) -> PlayRequest {
        match &mut self.element {
            Some(element) => {
                debug!("Playing native video");
                element.request_play();
                PlayRequest::Pending
            }
            None => PlayRequest::Unavailable,
        }
    }

    fn pause(&mut self) {
        if let Some(element) = &mut self.element {
            element.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(element) = &mut self.element {
            element.pause();
            element.set_current_time(0.0);
        }
    }

    fn seek(&mut self, fraction: f64) {
        let Some(element) = &mut self.element else {
            return;
        };

        match element.duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
                element.set_current_time(fraction * duration);
            }
            _ => debug!("Ignoring seek before metadata is loaded"),
        }
    }

    fn toggle_mute(&mut self) -> Option<bool> {
        let element = self.element.as_mut()?;
        let muted = !element.muted();
        element.set_muted(muted);
        Some(muted)
    }

    fn is_muted(&self) -> bool {
        self.element.as_ref().is_some_and(|e| e.muted())
    }

    fn is_paused(&self) -> bool {
        self.element.as_ref().is_none_or(|e| e.is_paused())
    }

    fn progress(&self) -> f64 {
        self.element
            .as_ref()
            .map_or(0.0, |e| fraction_of(e.current_time(), e.duration()))
    }

    fn polls_progress(&self) -> bool {
        false
    }

    fn translate(&mut self, event: HostEvent) -> Option<BackendEvent> {
        self.element.as_ref()?;

        match event {
            HostEvent::Media(MediaEvent::LoadedMetadata) => Some(BackendEvent::Ready),
            HostEvent::Media(MediaEvent::Play) => Some(BackendEvent::Playing),
            HostEvent::Media(MediaEvent::Pause) => {
                // Elements fire `pause` right before `ended`; only the latter counts
                let ended = self.element.as_ref().is_some_and(|e| e.has_ended());
                (!ended).then_some(BackendEvent::Paused)
            }
            HostEvent::Media(MediaEvent::Ended) => Some(BackendEvent::Ended),
            HostEvent::Media(MediaEvent::TimeUpdate) => Some(BackendEvent::Progress(self.progress())),
            HostEvent::PlayResolved(Ok(())) => Some(BackendEvent::PlayConfirmed),
            HostEvent::PlayResolved(Err(reason)) => Some(BackendEvent::PlayRejected(reason)),
            HostEvent::Embed(_) => None,
        }
    }

    fn teardown(&mut self) {
        if let Some(element) = &mut self.element {
            element.set_current_time(0.0);
        }
        self.release_element();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VideoType;
    use crate::testing::FakeHost;

    fn loaded(host: &mut FakeHost, duration: Option<f64>) -> NativeAdapter {
        let mut adapter = NativeAdapter::new();
        let record = VideoRecord::new("b", VideoType::Upload, "/media/v.mp4");
        adapter.load(SessionId::default().next(), &record, host).unwrap();
        host.last_media().borrow_mut().duration = duration;
        adapter
    }

    #[test]
    fn test_load_creates_element_without_autoplay() {
        let mut host = FakeHost::default();
        let adapter = loaded(&mut host, Some(10.0));

        assert_eq!(adapter.readiness(), Readiness::Ready);
        let media = host.last_media();
        let media = media.borrow();
        assert_eq!(media.source.url, "/media/v.mp4");
        assert!(!media.source.autoplay);
        assert_eq!(media.play_requests, 0);
    }

    #[test]
    fn test_reload_detaches_previous_element() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, Some(10.0));
        let first = host.last_media();

        let record = VideoRecord::new("c", VideoType::Upload, "/media/w.mp4");
        adapter.load(SessionId::default().next().next(), &record, &mut host).unwrap();

        assert!(first.borrow().detached);
        assert_eq!(host.media.len(), 2);
    }

    #[test]
    fn test_seek_round_trips_through_progress() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, Some(120.0));

        adapter.seek(0.5);
        assert!((adapter.progress() - 0.5).abs() < 1e-9);

        adapter.seek(7.0);
        assert!((adapter.progress() - 1.0).abs() < 1e-9);

        adapter.seek(-1.0);
        assert_eq!(adapter.progress(), 0.0);
    }

    #[test]
    fn test_progress_is_zero_without_metadata() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, None);
        host.last_media().borrow_mut().current_time = 4.0;

        assert_eq!(adapter.progress(), 0.0);
        adapter.seek(0.5);
        assert_eq!(host.last_media().borrow().current_time, 4.0);
    }

    #[test]
    fn test_pause_before_ended_is_swallowed() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, Some(10.0));

        assert_eq!(
            adapter.translate(HostEvent::Media(MediaEvent::Pause)),
            Some(BackendEvent::Paused)
        );

        host.last_media().borrow_mut().ended = true;
        assert_eq!(adapter.translate(HostEvent::Media(MediaEvent::Pause)), None);
        assert_eq!(
            adapter.translate(HostEvent::Media(MediaEvent::Ended)),
            Some(BackendEvent::Ended)
        );
    }

    #[test]
    fn test_toggle_mute_twice_restores_state() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, Some(10.0));

        assert_eq!(adapter.toggle_mute(), Some(true));
        assert_eq!(adapter.toggle_mute(), Some(false));
        assert!(!adapter.is_muted());
    }

    #[test]
    fn test_teardown_rewinds_and_detaches() {
        let mut host = FakeHost::default();
        let mut adapter = loaded(&mut host, Some(10.0));
        host.last_media().borrow_mut().current_time = 6.0;

        adapter.teardown();

        let media = host.last_media();
        assert!(media.borrow().detached);
        assert_eq!(media.borrow().current_time, 0.0);
        assert_eq!(adapter.readiness(), Readiness::Uninitialized);
        assert_eq!(adapter.translate(HostEvent::Media(MediaEvent::TimeUpdate)), None);
    }
}
