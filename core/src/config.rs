use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::HexColor;

/// Allowed modal width in pixels
pub const MODAL_WIDTH_RANGE: (u32, u32) = (280, 800);
/// Allowed modal height in pixels
pub const MODAL_HEIGHT_RANGE: (u32, u32) = (400, 900);

/// Which bottom corner the widget trigger sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetPosition {
    BottomLeft,
    #[default]
    BottomRight,
}

/// Delays and intervals driving the modal's transient UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Delay between opening the modal and the first autoplay attempt
    pub open_autoplay_delay_ms: u64,
    /// Delay between switching videos and the autoplay attempt
    pub switch_autoplay_delay_ms: u64,
    /// How long controls stay visible after playback starts
    pub auto_hide_delay_ms: u64,
    /// How long the CTA subtitle stays up after playback starts
    pub subtitle_duration_ms: u64,
    /// Progress polling interval for embedded players
    pub progress_poll_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            open_autoplay_delay_ms: 300,
            switch_autoplay_delay_ms: 500,
            auto_hide_delay_ms: 3000,
            subtitle_duration_ms: 5000,
            progress_poll_interval_ms: 100,
        }
    }
}

impl Timings {
    pub fn open_autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.open_autoplay_delay_ms)
    }

    pub fn switch_autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.switch_autoplay_delay_ms)
    }

    pub fn auto_hide_delay(&self) -> Duration {
        Duration::from_millis(self.auto_hide_delay_ms)
    }

    pub fn subtitle_duration(&self) -> Duration {
        Duration::from_millis(self.subtitle_duration_ms)
    }

    pub fn progress_poll_interval(&self) -> Duration {
        // A zero interval would spin the timer wheel forever
        Duration::from_millis(self.progress_poll_interval_ms.max(1))
    }
}

/// Presentation settings for the widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Accent color exposed to the stylesheet
    pub primary_color: HexColor,
    /// Trigger size in pixels
    pub widget_size: u32,
    /// Modal width in pixels
    pub modal_width: u32,
    /// Modal height in pixels
    pub modal_height: u32,
    /// Trigger corner
    pub position: WidgetPosition,
    /// UI delays
    pub timings: Timings,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            primary_color: HexColor::ACCENT,
            widget_size: 100,
            modal_width: 340,
            modal_height: 650,
            position: WidgetPosition::default(),
            timings: Timings::default(),
        }
    }
}

impl WidgetConfig {
    /// Load a JSON config file. Out-of-range dimensions are clamped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!("Loaded widget config from {}", path.display());
        Ok(config.normalized())
    }

    /// Clamp the modal dimensions into the ranges the settings page allows
    pub fn normalized(mut self) -> Self {
        self.modal_width = self.modal_width.clamp(MODAL_WIDTH_RANGE.0, MODAL_WIDTH_RANGE.1);
        self.modal_height = self.modal_height.clamp(MODAL_HEIGHT_RANGE.0, MODAL_HEIGHT_RANGE.1);
        self
    }

    /// Value of the stylesheet's accent custom property
    pub fn accent_property(&self) -> (&'static str, String) {
        ("--vpw-primary-color", self.primary_color.to_string())
    }
}
