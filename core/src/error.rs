use thiserror::Error;

/// Errors raised by the widget core.
///
/// None of these reach the visitor as a blocking dialog. Callers log them and
/// degrade (no modal, unplayable video, manual play affordance).
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The catalog handed to the widget contained no enabled videos
    #[error("no videos found in catalog")]
    EmptyCatalog,

    /// The serialized catalog could not be parsed
    #[error("malformed catalog data: {0}")]
    MalformedCatalog(#[from] serde_json::Error),

    /// A video URL did not yield a playable identifier for its backend
    #[error("unplayable video source: {url}")]
    MalformedSource { url: String },

    /// The platform refused to start playback (autoplay policy, no user gesture)
    #[error("playback blocked: {0}")]
    PlaybackBlocked(String),

    /// A catalog index outside `[0, len)`
    #[error("video index {index} out of range (catalog has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, WidgetError>;
