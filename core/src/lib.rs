pub mod catalog;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod focus;
pub mod host;
pub mod media;
pub mod share;
pub mod style;
pub mod timers;
pub mod view;

#[cfg(test)]
mod testing;

// Re-exports
pub use catalog::{VideoCatalog, VideoRecord, VideoType, publish_catalog};
pub use color::HexColor;
pub use config::{Timings, WidgetConfig, WidgetPosition};
pub use controller::PlayerController;
pub use error::{Result, WidgetError};
pub use focus::{FocusTarget, ModalControl};
pub use host::{
    EmbedEvent, EmbedPlayer, EmbedRequest, EmbedState, HostEvent, MediaElement, MediaEvent, NativeSource, PlayerHost,
    SessionId,
};
pub use media::{BackendKind, EmbedApis, EmbedService, detect_backend};
pub use share::{ShareError, ShareOutcome, ShareSurface};
pub use view::{ActiveBackend, ModalKey, ModalTarget, ModalView, Phase, PlayerState, Signal};
