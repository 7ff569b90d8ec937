//! Display surface the presentation draws on.
//!
//! The surface has two mutually exclusive regions (group logo and video frame)
//! plus a caption line. Implementations are shared across threads, so every
//! method takes `&self`.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use image::RgbaImage;

use crate::style::Style;

/// A decoded video frame ready to show
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub index: u64,
    pub image: Arc<RgbaImage>,
}

impl VideoFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Spectrum-driven transforms for the logo and frame regions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    pub logo_scale: Vec3,
    pub frame_scale: Vec3,
    /// Logo roll around the view axis: the raw bass (bin 0) magnitude, left
    /// to the renderer to scale
    pub logo_roll: f32,
}

impl Default for Decoration {
    fn default() -> Self {
        Self {
            logo_scale: Vec3::ONE,
            frame_scale: Vec3::ONE,
            logo_roll: 0.0,
        }
    }
}

pub trait DisplaySurface: Send + Sync {
    /// Replace the caption; style and text change together
    fn set_caption(&self, text: &str, style: &Style);

    /// Select the logo sprite shown in the logo region
    fn set_logo(&self, logo: &str);

    fn set_logo_visible(&self, visible: bool);

    fn set_frame_visible(&self, visible: bool);

    /// Frame-ready notification from the video source
    fn present_frame(&self, frame: &VideoFrame);

    /// Caption tint (cosmetic)
    fn set_text_color(&self, _rgb: Vec3) {}

    /// Cosmetic scale transforms
    fn apply_decoration(&self, _decoration: Decoration) {}
}

/// What the console display currently shows
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    pub caption: String,
    pub style: Option<Style>,
    pub logo: Option<String>,
    pub logo_visible: bool,
    pub frame_visible: bool,
    pub frame_index: Option<u64>,
    pub text_color: Option<Vec3>,
    pub decoration: Decoration,
}

/// Headless display that logs every visible change
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    state: Mutex<ScreenState>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current screen state
    pub fn snapshot(&self) -> ScreenState {
        self.with_state(|state| state.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ScreenState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn check_exclusive(state: &ScreenState) {
        if state.logo_visible && state.frame_visible {
            log::warn!("Logo and video frame are both visible");
        }
    }
}

impl DisplaySurface for ConsoleDisplay {
    fn set_caption(&self, text: &str, style: &Style) {
        self.with_state(|state| {
            state.caption = text.to_string();
            state.style = Some(style.clone());
        });
        if !text.is_empty() {
            log::info!(
                "Caption: {} [font: {}, gradient: {}]",
                text,
                style.font.id,
                style.gradient.id
            );
        }
    }

    fn set_logo(&self, logo: &str) {
        self.with_state(|state| state.logo = Some(logo.to_string()));
        log::info!("Logo: {}", logo);
    }

    fn set_logo_visible(&self, visible: bool) {
        self.with_state(|state| {
            state.logo_visible = visible;
            Self::check_exclusive(state);
        });
    }

    fn set_frame_visible(&self, visible: bool) {
        self.with_state(|state| {
            state.frame_visible = visible;
            Self::check_exclusive(state);
        });
    }

    fn present_frame(&self, frame: &VideoFrame) {
        self.with_state(|state| state.frame_index = Some(frame.index));
        log::debug!(
            "Frame {} ({}x{})",
            frame.index,
            frame.width(),
            frame.height()
        );
    }

    fn set_text_color(&self, rgb: Vec3) {
        self.with_state(|state| state.text_color = Some(rgb));
    }

    fn apply_decoration(&self, decoration: Decoration) {
        self.with_state(|state| state.decoration = decoration);
    }
}
