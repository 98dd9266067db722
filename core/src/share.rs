use log::{debug, info, warn};
use thiserror::Error;

/// Title handed to native share sheets
pub const SHARE_TITLE: &str = "Check out this video!";
/// Confirmation shown after a successful copy
pub const COPIED_NOTICE: &str = "Link copied!";

/// Why a share surface did not deliver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("share surface not available")]
    Unavailable,
    #[error("share cancelled by the user")]
    Cancelled,
    #[error("share failed: {0}")]
    Failed(String),
}

/// The platform's ways of handing a link to the user
pub trait ShareSurface {
    /// URL of the current page, used when a record has no URL
    fn page_url(&self) -> String;
    /// Open a native share sheet
    fn native_share(&mut self, title: &str, url: &str) -> Result<(), ShareError>;
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ShareError>;
    /// Select-and-copy fallback for platforms without a clipboard API
    fn legacy_copy(&mut self, text: &str) -> Result<(), ShareError>;
    /// Show a short user-visible confirmation
    fn notify(&mut self, message: &str);
}

/// Where a share ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
    CopiedLegacy,
    /// The user dismissed the share sheet
    Cancelled,
    Failed(String),
}

/// Share `url`, falling back to the page URL when it is empty.
///
/// Tries the native share sheet, then the clipboard, then the legacy copy.
/// A cancelled share sheet ends the chain without a notice.
pub fn share_link(surface: &mut dyn ShareSurface, url: &str) -> ShareOutcome {
    let url = if url.is_empty() { surface.page_url() } else { url.to_string() };
    info!("Sharing video URL: {}", url);

    match surface.native_share(SHARE_TITLE, &url) {
        Ok(()) => return ShareOutcome::Shared,
        Err(ShareError::Cancelled) => {
            debug!("Share sheet dismissed");
            return ShareOutcome::Cancelled;
        }
        Err(ShareError::Unavailable) => {}
        Err(e) => debug!("{}, copying instead", e),
    }

    let outcome = match surface.copy_to_clipboard(&url) {
        Ok(()) => ShareOutcome::Copied,
        Err(e) => {
            debug!("Clipboard unavailable ({}), using legacy copy", e);
            match surface.legacy_copy(&url) {
                Ok(()) => ShareOutcome::CopiedLegacy,
                Err(e) => {
                    warn!("Could not copy link: {}", e);
                    return ShareOutcome::Failed(e.to_string());
                }
            }
        }
    };

    surface.notify(COPIED_NOTICE);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Surface {
        native: Option<Result<(), ShareError>>,
        clipboard: Option<Result<(), ShareError>>,
        legacy: Option<Result<(), ShareError>>,
        shared: Vec<String>,
        notices: Vec<String>,
    }

    impl ShareSurface for Surface {
        fn page_url(&self) -> String {
            "https://example.com/landing".into()
        }

        fn native_share(&mut self, _title: &str, url: &str) -> Result<(), ShareError> {
            self.shared.push(url.to_string());
            self.native.clone().unwrap_or(Err(ShareError::Unavailable))
        }

        fn copy_to_clipboard(&mut self, text: &str) -> Result<(), ShareError> {
            self.shared.push(text.to_string());
            self.clipboard.clone().unwrap_or(Err(ShareError::Unavailable))
        }

        fn legacy_copy(&mut self, text: &str) -> Result<(), ShareError> {
            self.shared.push(text.to_string());
            self.legacy.clone().unwrap_or(Err(ShareError::Unavailable))
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn test_native_share_wins_without_notice() {
        let mut surface = Surface {
            native: Some(Ok(())),
            ..Default::default()
        };
        assert_eq!(share_link(&mut surface, "https://youtu.be/x"), ShareOutcome::Shared);
        assert!(surface.notices.is_empty());
    }

    #[test]
    fn test_cancelled_share_is_silent() {
        let mut surface = Surface {
            native: Some(Err(ShareError::Cancelled)),
            clipboard: Some(Ok(())),
            ..Default::default()
        };
        assert_eq!(share_link(&mut surface, "https://youtu.be/x"), ShareOutcome::Cancelled);
        assert_eq!(surface.shared.len(), 1);
        assert!(surface.notices.is_empty());
    }

    #[test]
    fn test_failed_share_falls_back_to_clipboard() {
        let mut surface = Surface {
            native: Some(Err(ShareError::Failed("denied".into()))),
            clipboard: Some(Ok(())),
            ..Default::default()
        };
        assert_eq!(share_link(&mut surface, "https://youtu.be/x"), ShareOutcome::Copied);
        assert_eq!(surface.notices, [COPIED_NOTICE]);
    }

    #[test]
    fn test_legacy_copy_and_page_url_fallback() {
        let mut surface = Surface {
            legacy: Some(Ok(())),
            ..Default::default()
        };
        assert_eq!(share_link(&mut surface, ""), ShareOutcome::CopiedLegacy);
        assert!(surface.shared.iter().all(|u| u == "https://example.com/landing"));
        assert_eq!(surface.notices, [COPIED_NOTICE]);
    }

    #[test]
    fn test_nothing_available_fails() {
        let mut surface = Surface::default();
        assert!(matches!(share_link(&mut surface, "/v.mp4"), ShareOutcome::Failed(_)));
        assert!(surface.notices.is_empty());
    }
}
