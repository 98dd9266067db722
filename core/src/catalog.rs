use log::{debug, error};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::error::{Result, WidgetError};

/// Declared source type of a video entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Uploaded media file served directly
    #[default]
    Upload,
    /// YouTube watch/share/embed URL
    Youtube,
    /// Vimeo page or player URL
    Vimeo,
}

/// One curated video entry, as rendered into the widget's data attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Opaque identifier, unique within a catalog
    #[serde(deserialize_with = "loose_id")]
    pub id: String,
    /// Title overlay text
    #[serde(default)]
    pub title: String,
    /// Subtitle revealed briefly after playback starts
    #[serde(default)]
    pub cta_text: String,
    /// Declared source type
    #[serde(default)]
    pub video_type: VideoType,
    /// Media file or service URL
    #[serde(default)]
    pub video_url: String,
    /// Trigger cover image
    #[serde(default)]
    pub cover_image: String,
    /// Switch-button label
    #[serde(default)]
    pub button_text: String,
    /// Link attached to the switch button by the admin (carried, not used by the player)
    #[serde(default)]
    pub button_url: String,
    #[serde(default = "default_button_bg", deserialize_with = "loose_color_bg")]
    pub button_bg_color: HexColor,
    #[serde(default = "default_button_text", deserialize_with = "loose_color_text")]
    pub button_text_color: HexColor,
    #[serde(default = "default_hover_bg", deserialize_with = "loose_color_hover_bg")]
    pub button_hover_bg: HexColor,
    #[serde(default = "default_hover_text", deserialize_with = "loose_color_hover_text")]
    pub button_hover_text: HexColor,
    /// Only enabled records are published
    #[serde(default = "default_enabled", deserialize_with = "loose_bool")]
    pub enabled: bool,
    /// Ascending ordering key
    #[serde(default, deserialize_with = "loose_int")]
    pub order: i64,
}

impl VideoRecord {
    /// Minimal record with admin defaults for every optional field
    pub fn new(id: impl Into<String>, video_type: VideoType, video_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            cta_text: String::new(),
            video_type,
            video_url: video_url.into(),
            cover_image: String::new(),
            button_text: String::new(),
            button_url: String::new(),
            button_bg_color: default_button_bg(),
            button_text_color: default_button_text(),
            button_hover_bg: default_hover_bg(),
            button_hover_text: default_hover_text(),
            enabled: true,
            order: 0,
        }
    }

    /// Label of the switch button at `index`, falling back to "Video N"
    pub fn button_label(&self, index: usize) -> String {
        let text = self.button_text.trim();
        if text.is_empty() {
            format!("Video {}", index + 1)
        } else {
            text.to_string()
        }
    }
}

fn default_button_bg() -> HexColor {
    HexColor::ACCENT
}

fn default_button_text() -> HexColor {
    HexColor::BUTTON_TEXT
}

fn default_hover_bg() -> HexColor {
    HexColor::BUTTON_HOVER_BG
}

fn default_hover_text() -> HexColor {
    HexColor::BUTTON_HOVER_TEXT
}

fn default_enabled() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null(()),
}

fn loose_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => Ok(s),
        Scalar::Int(n) => Ok(n.to_string()),
        Scalar::Float(n) => Ok(n.to_string()),
        Scalar::Bool(_) | Scalar::Null(()) => Err(de::Error::custom("video id must be a string or number")),
    }
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b,
        Scalar::Int(n) => n != 0,
        Scalar::Float(n) => n != 0.0,
        Scalar::Text(s) => !matches!(s.trim(), "" | "0" | "false"),
        Scalar::Null(()) => false,
    })
}

fn loose_int<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => Ok(n),
        Scalar::Float(n) => Ok(n as i64),
        Scalar::Text(s) if s.trim().is_empty() => Ok(0),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid order value: {s}"))),
        Scalar::Bool(_) | Scalar::Null(()) => Ok(0),
    }
}

fn loose_color<'de, D: Deserializer<'de>>(deserializer: D, fallback: HexColor) -> std::result::Result<HexColor, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map_or(fallback, |value| HexColor::sanitize(&value, fallback)))
}

fn loose_color_bg<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<HexColor, D::Error> {
    loose_color(d, default_button_bg())
}

fn loose_color_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<HexColor, D::Error> {
    loose_color(d, default_button_text())
}

fn loose_color_hover_bg<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<HexColor, D::Error> {
    loose_color(d, default_hover_bg())
}

fn loose_color_hover_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<HexColor, D::Error> {
    loose_color(d, default_hover_text())
}

/// Ordered, non-empty list of enabled videos shown by one modal.
///
/// The controller consumes the catalog as-is; filtering and ordering are the
/// provider's job (see [`publish_catalog`]).
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCatalog {
    records: Vec<VideoRecord>,
}

impl VideoCatalog {
    /// Wrap an already published sequence. Fails only when it is empty.
    pub fn new(records: Vec<VideoRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(WidgetError::EmptyCatalog);
        }
        Ok(Self { records })
    }

    /// Deserialize the widget's `data-videos` attribute
    pub fn from_data_attribute(json: &str) -> Result<Self> {
        let records: Vec<VideoRecord> = serde_json::from_str(json)?;
        debug!("Loaded {} videos from data attribute", records.len());
        Self::new(records)
    }

    /// Serialize back into the `data-videos` attribute format
    pub fn to_data_attribute(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VideoRecord> {
        self.records.get(index)
    }

    /// Like [`get`](Self::get), reporting the valid range on a miss
    pub fn record(&self, index: usize) -> Result<&VideoRecord> {
        self.records.get(index).ok_or(WidgetError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// First entry; the one a freshly opened modal loads
    pub fn first(&self) -> &VideoRecord {
        &self.records[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.records.iter()
    }

    /// Whether the modal renders switch buttons
    pub fn has_switcher(&self) -> bool {
        self.records.len() > 1
    }
}

/// Provider-side publication: keep enabled records and order them by `order`.
///
/// Sorting is stable, so records sharing an `order` keep their stored order.
pub fn publish_catalog(records: impl IntoIterator<Item = VideoRecord>) -> Result<VideoCatalog> {
    let mut published: Vec<VideoRecord> = records.into_iter().filter(|r| r.enabled).collect();
    published.sort_by_key(|r| r.order);

    if published.is_empty() {
        error!("No enabled videos to publish");
    }
    VideoCatalog::new(published)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_ATTRIBUTE: &str = r##"[
        {"id": "video_1", "title": "Welcome", "cta_text": "Say hi", "video_type": "upload",
         "video_url": "/media/v.mp4", "button_text": "", "button_bg_color": "#ff0000",
         "enabled": "1", "order": "2"},
        {"id": 42, "video_type": "youtube", "video_url": "https://youtu.be/dQw4w9WgXcQ",
         "button_hover_bg": "garbage", "enabled": 1, "order": 1}
    ]"##;

    #[test]
    fn test_data_attribute_accepts_loose_scalars() {
        let catalog = VideoCatalog::from_data_attribute(DATA_ATTRIBUTE).unwrap();
        assert_eq!(catalog.len(), 2);

        let first = catalog.first();
        assert_eq!(first.id, "video_1");
        assert_eq!(first.order, 2);
        assert!(first.enabled);
        assert_eq!(first.button_bg_color, HexColor::rgb(0xff, 0, 0));
        assert_eq!(first.button_text_color, HexColor::BUTTON_TEXT);

        let second = catalog.get(1).unwrap();
        assert_eq!(second.id, "42");
        assert_eq!(second.video_type, VideoType::Youtube);
        assert_eq!(second.button_hover_bg, HexColor::BUTTON_HOVER_BG);
    }

    #[test]
    fn test_catalog_keeps_given_order() {
        // The controller side never re-sorts, even when `order` disagrees
        let catalog = VideoCatalog::from_data_attribute(DATA_ATTRIBUTE).unwrap();
        assert_eq!(catalog.first().id, "video_1");
    }

    #[test]
    fn test_record_out_of_range() {
        let catalog = VideoCatalog::from_data_attribute(DATA_ATTRIBUTE).unwrap();
        let len = catalog.len();

        assert!(catalog.record(len - 1).is_ok());
        assert!(matches!(
            catalog.record(len),
            Err(WidgetError::IndexOutOfRange { index, len: l }) if index == len && l == len
        ));
    }

    #[test]
    fn test_empty_or_malformed_attribute() {
        assert!(matches!(
            VideoCatalog::from_data_attribute("[]"),
            Err(WidgetError::EmptyCatalog)
        ));
        assert!(matches!(
            VideoCatalog::from_data_attribute("{not json"),
            Err(WidgetError::MalformedCatalog(_))
        ));
    }

    #[test]
    fn test_publish_filters_and_sorts() {
        let mut a = VideoRecord::new("a", VideoType::Upload, "/a.mp4");
        a.order = 3;
        let mut b = VideoRecord::new("b", VideoType::Upload, "/b.mp4");
        b.order = 1;
        let mut c = VideoRecord::new("c", VideoType::Upload, "/c.mp4");
        c.enabled = false;
        let mut d = VideoRecord::new("d", VideoType::Upload, "/d.mp4");
        d.order = 1;

        let catalog = publish_catalog([a, b, c, d]).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a"]);
    }

    #[test]
    fn test_publish_all_disabled_is_empty() {
        let mut only = VideoRecord::new("x", VideoType::Upload, "/x.mp4");
        only.enabled = false;
        assert!(matches!(publish_catalog([only]), Err(WidgetError::EmptyCatalog)));
    }

    #[test]
    fn test_button_label_fallback() {
        let mut record = VideoRecord::new("x", VideoType::Upload, "/x.mp4");
        assert_eq!(record.button_label(2), "Video 3");
        record.button_text = "  Tour ".to_string();
        assert_eq!(record.button_label(2), "Tour");
    }
}
