use std::collections::HashMap;

use crate::catalog::{VideoCatalog, VideoRecord};
use crate::color::HexColor;

/// Background and text color of a switch button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub background: HexColor,
    pub text: HexColor,
}

/// Normal and hover theme of one switch button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonStyle {
    pub label: String,
    pub normal: ColorPair,
    pub hover: ColorPair,
}

impl ButtonStyle {
    pub fn from_record(record: &VideoRecord, index: usize) -> Self {
        Self {
            label: record.button_label(index),
            normal: ColorPair {
                background: record.button_bg_color,
                text: record.button_text_color,
            },
            hover: ColorPair {
                background: record.button_hover_bg,
                text: record.button_hover_text,
            },
        }
    }

    pub fn colors(&self, hovered: bool) -> ColorPair {
        if hovered { self.hover } else { self.normal }
    }
}

/// Per-video button themes, keyed by video id.
///
/// Only populated when the catalog renders switch buttons.
#[derive(Debug, Clone, Default)]
pub struct ButtonStyles {
    styles: HashMap<String, ButtonStyle>,
    hovered: Option<String>,
}

impl ButtonStyles {
    pub fn from_catalog(catalog: &VideoCatalog) -> Self {
        if !catalog.has_switcher() {
            return Self::default();
        }

        let styles = catalog
            .iter()
            .enumerate()
            .map(|(i, record)| (record.id.clone(), ButtonStyle::from_record(record, i)))
            .collect();

        Self { styles, hovered: None }
    }

    pub fn get(&self, video_id: &str) -> Option<&ButtonStyle> {
        self.styles.get(video_id)
    }

    pub fn set_hovered(&mut self, video_id: Option<&str>) {
        self.hovered = video_id.filter(|id| self.styles.contains_key(*id)).map(str::to_string);
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Colors to render for `video_id` right now
    pub fn colors(&self, video_id: &str) -> Option<ColorPair> {
        let hovered = self.hovered.as_deref() == Some(video_id);
        self.styles.get(video_id).map(|s| s.colors(hovered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VideoType;

    fn catalog() -> VideoCatalog {
        let mut first = VideoRecord::new("a", VideoType::Upload, "/a.mp4");
        first.button_text = "Intro".into();
        first.button_hover_bg = HexColor::rgb(1, 2, 3);
        let second = VideoRecord::new("b", VideoType::Upload, "/b.mp4");
        VideoCatalog::new(vec![first, second]).unwrap()
    }

    #[test]
    fn test_styles_follow_hover() {
        let mut styles = ButtonStyles::from_catalog(&catalog());
        assert_eq!(styles.colors("a").unwrap().background, HexColor::ACCENT);

        styles.set_hovered(Some("a"));
        assert_eq!(styles.colors("a").unwrap().background, HexColor::rgb(1, 2, 3));
        assert_eq!(styles.colors("b").unwrap().background, HexColor::ACCENT);

        styles.set_hovered(None);
        assert_eq!(styles.colors("a").unwrap().background, HexColor::ACCENT);
    }

    #[test]
    fn test_labels_fall_back_to_position() {
        let styles = ButtonStyles::from_catalog(&catalog());
        assert_eq!(styles.get("a").unwrap().label, "Intro");
        assert_eq!(styles.get("b").unwrap().label, "Video 2");
    }

    #[test]
    fn test_single_video_has_no_buttons() {
        let single = VideoCatalog::new(vec![VideoRecord::new("a", VideoType::Upload, "/a.mp4")]).unwrap();
        let mut styles = ButtonStyles::from_catalog(&single);
        styles.set_hovered(Some("a"));
        assert_eq!(styles.colors("a"), None);
        assert_eq!(styles.hovered(), None);
    }
}
