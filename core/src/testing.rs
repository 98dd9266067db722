//! Recording host used by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::focus::FocusTarget;
use crate::host::{EmbedPlayer, EmbedRequest, MediaElement, NativeSource, PlayerHost, SessionId};
use crate::share::{ShareError, ShareSurface};

#[derive(Debug)]
pub struct FakeMedia {
    pub session: SessionId,
    pub source: NativeSource,
    pub duration: Option<f64>,
    pub current_time: f64,
    pub paused: bool,
    pub ended: bool,
    pub muted: bool,
    pub play_requests: usize,
    pub detached: bool,
}

struct MediaHandle(Rc<RefCell<FakeMedia>>);

impl MediaElement for MediaHandle {
    fn request_play(&mut self) {
        let mut media = self.0.borrow_mut();
        media.play_requests += 1;
        media.paused = false;
    }

    fn pause(&mut self) {
        self.0.borrow_mut().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.0.borrow().paused
    }

    fn has_ended(&self) -> bool {
        self.0.borrow().ended
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.0.borrow_mut().current_time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.0.borrow().duration
    }

    fn muted(&self) -> bool {
        self.0.borrow().muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.0.borrow_mut().muted = muted;
    }

    fn detach(&mut self) {
        self.0.borrow_mut().detached = true;
    }
}

#[derive(Debug)]
pub struct FakeEmbed {
    pub session: SessionId,
    pub request: EmbedRequest,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub stop_calls: usize,
    pub current_time: f64,
    pub duration: f64,
    pub muted: bool,
    pub destroyed: bool,
}

struct EmbedHandle(Rc<RefCell<FakeEmbed>>);

impl EmbedPlayer for EmbedHandle {
    fn play_video(&mut self) {
        self.0.borrow_mut().play_calls += 1;
    }

    fn pause_video(&mut self) {
        self.0.borrow_mut().pause_calls += 1;
    }

    fn stop_video(&mut self) {
        self.0.borrow_mut().stop_calls += 1;
    }

    fn seek_to(&mut self, seconds: f64) {
        self.0.borrow_mut().current_time = seconds;
    }

    fn mute(&mut self) {
        self.0.borrow_mut().muted = true;
    }

    fn unmute(&mut self) {
        self.0.borrow_mut().muted = false;
    }

    fn is_muted(&self) -> bool {
        self.0.borrow().muted
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().current_time
    }

    fn duration(&self) -> f64 {
        self.0.borrow().duration
    }

    fn destroy(&mut self) {
        self.0.borrow_mut().destroyed = true;
    }
}

#[derive(Debug, Default)]
pub struct FakeHost {
    pub media: Vec<Rc<RefCell<FakeMedia>>>,
    pub embeds: Vec<Rc<RefCell<FakeEmbed>>>,
    pub scripts: Vec<String>,
    pub focus: Vec<FocusTarget>,
    pub clears: usize,
    /// Outcome of the native share sheet; unavailable when `None`
    pub native_share: Option<Result<(), ShareError>>,
    pub clipboard: Vec<String>,
    pub notices: Vec<String>,
}

impl FakeHost {
    pub fn last_media(&self) -> Rc<RefCell<FakeMedia>> {
        Rc::clone(self.media.last().expect("no media element created"))
    }

    pub fn last_embed(&self) -> Rc<RefCell<FakeEmbed>> {
        Rc::clone(self.embeds.last().expect("no embed player created"))
    }
}

impl PlayerHost for FakeHost {
    fn create_media_element(&mut self, session: SessionId, source: &NativeSource) -> Box<dyn MediaElement> {
        let media = Rc::new(RefCell::new(FakeMedia {
            session,
            source: source.clone(),
            duration: None,
            current_time: 0.0,
            paused: true,
            ended: false,
            muted: false,
            play_requests: 0,
            detached: false,
        }));
        self.media.push(Rc::clone(&media));
        Box::new(MediaHandle(media))
    }

    fn inject_script(&mut self, src: &str) {
        self.scripts.push(src.to_string());
    }

    fn create_embed_player(&mut self, session: SessionId, request: &EmbedRequest) -> Box<dyn EmbedPlayer> {
        let embed = Rc::new(RefCell::new(FakeEmbed {
            session,
            request: request.clone(),
            play_calls: 0,
            pause_calls: 0,
            stop_calls: 0,
            current_time: 0.0,
            duration: 0.0,
            muted: false,
            destroyed: false,
        }));
        self.embeds.push(Rc::clone(&embed));
        Box::new(EmbedHandle(embed))
    }

    fn clear_player_area(&mut self) {
        self.clears += 1;
    }

    fn move_focus(&mut self, target: FocusTarget) {
        self.focus.push(target);
    }
}

impl ShareSurface for FakeHost {
    fn page_url(&self) -> String {
        "https://shop.example.com/".to_string()
    }

    fn native_share(&mut self, _title: &str, _url: &str) -> Result<(), ShareError> {
        self.native_share.clone().unwrap_or(Err(ShareError::Unavailable))
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ShareError> {
        self.clipboard.push(text.to_string());
        Ok(())
    }

    fn legacy_copy(&mut self, text: &str) -> Result<(), ShareError> {
        self.clipboard.push(text.to_string());
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
