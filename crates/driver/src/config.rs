//! Driver configuration.
//!
//! Values come from code, from a JSON document, or from `SCENE_*` environment
//! variables. Every constructor clamps to usable ranges.

use core::time::Duration;
use std::env;

use renderer::{DEFAULT_IDLE_FRAMES, EngineConfig, MAX_SCRIPT_DEPTH, ReplayLimits};
use raster_backend::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use scene_script::Color;
use serde::Deserialize;

use crate::error::DriverError;

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_THREAD_NAME: &str = "scene-render";

/// Largest accepted viewport edge.
const MAX_VIEWPORT: u32 = 16_384;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Minimum time between two redraws.
    pub frame_interval_ms: u64,
    /// Initial clear colour as `[r, g, b, a]`.
    pub clear_color: [u8; 4],
    pub max_script_depth: usize,
    pub shader_idle_frames: u64,
    pub thread_name: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_WIDTH,
            viewport_height: DEFAULT_HEIGHT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            clear_color: Color::BLACK.to_array(),
            max_script_depth: MAX_SCRIPT_DEPTH,
            shader_idle_frames: DEFAULT_IDLE_FRAMES,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

impl DriverConfig {
    /// Construct a config with explicit viewport and frame interval; other
    /// fields take their defaults.
    pub fn new(viewport_width: u32, viewport_height: u32, frame_interval_ms: u64) -> Self {
        Self {
            viewport_width,
            viewport_height,
            frame_interval_ms,
            ..Self::default()
        }
        .clamped()
    }

    /// Load configuration from environment variables.
    ///
    /// - `SCENE_VIEWPORT`: `WIDTHxHEIGHT` (default 800x600)
    /// - `SCENE_FRAME_INTERVAL_MS`: redraw interval (default 16)
    /// - `SCENE_MAX_SCRIPT_DEPTH`: sub-script nesting ceiling (default 64)
    /// - `SCENE_SHADER_IDLE_FRAMES`: frames before an unused shader is dropped
    /// - `SCENE_CLEAR_COLOR`: `r,g,b,a` bytes (default opaque black)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let (viewport_width, viewport_height) = lookup("SCENE_VIEWPORT")
            .and_then(|val| parse_viewport(&val))
            .unwrap_or((defaults.viewport_width, defaults.viewport_height));
        let frame_interval_ms = lookup("SCENE_FRAME_INTERVAL_MS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.frame_interval_ms);
        let max_script_depth = lookup("SCENE_MAX_SCRIPT_DEPTH")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.max_script_depth);
        let shader_idle_frames = lookup("SCENE_SHADER_IDLE_FRAMES")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(defaults.shader_idle_frames);
        let clear_color = lookup("SCENE_CLEAR_COLOR")
            .and_then(|val| parse_color(&val))
            .unwrap_or(defaults.clear_color);
        Self {
            viewport_width,
            viewport_height,
            frame_interval_ms,
            clear_color,
            max_script_depth,
            shader_idle_frames,
            thread_name: defaults.thread_name,
        }
        .clamped()
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`DriverError::Config`] for malformed JSON or mistyped fields.
    pub fn from_json(text: &str) -> Result<Self, DriverError> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.clamped())
    }

    fn clamped(mut self) -> Self {
        self.viewport_width = self.viewport_width.clamp(1, MAX_VIEWPORT);
        self.viewport_height = self.viewport_height.clamp(1, MAX_VIEWPORT);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self.max_script_depth = self.max_script_depth.max(1);
        self.shader_idle_frames = self.shader_idle_frames.max(1);
        if self.thread_name.is_empty() {
            DEFAULT_THREAD_NAME.clone_into(&mut self.thread_name);
        }
        self
    }

    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub const fn clear_color(&self) -> Color {
        let [red, green, blue, alpha] = self.clear_color;
        Color::rgba(red, green, blue, alpha)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            clear_color: self.clear_color(),
            limits: ReplayLimits::new(self.max_script_depth),
            shader_idle_frames: self.shader_idle_frames,
        }
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_viewport(text: &str) -> Option<(u32, u32)> {
    let (width, height) = text.trim().split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// Parses `r,g,b,a`; alpha may be omitted and defaults to opaque.
pub fn parse_color(text: &str) -> Option<[u8; 4]> {
    let parts: Vec<u8> = text
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        &[red, green, blue] => Some([red, green, blue, 255]),
        &[red, green, blue, alpha] => Some([red, green, blue, alpha]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, val)| ((*key).to_owned(), (*val).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn env_values_override_defaults() {
        let config = DriverConfig::from_lookup(lookup_from(&[
            ("SCENE_VIEWPORT", "320x240"),
            ("SCENE_FRAME_INTERVAL_MS", "33"),
            ("SCENE_CLEAR_COLOR", "10, 20, 30"),
            ("SCENE_MAX_SCRIPT_DEPTH", "8"),
        ]));
        assert_eq!((config.viewport_width, config.viewport_height), (320, 240));
        assert_eq!(config.frame_interval(), Duration::from_millis(33));
        assert_eq!(config.clear_color, [10, 20, 30, 255]);
        assert_eq!(config.max_script_depth, 8);
        assert_eq!(config.shader_idle_frames, DEFAULT_IDLE_FRAMES);
    }

    #[test]
    fn bad_env_values_fall_back_and_clamp() {
        let config = DriverConfig::from_lookup(lookup_from(&[
            ("SCENE_VIEWPORT", "wide"),
            ("SCENE_FRAME_INTERVAL_MS", "0"),
            ("SCENE_CLEAR_COLOR", "1,2,3,4,5"),
            ("SCENE_MAX_SCRIPT_DEPTH", "0"),
        ]));
        assert_eq!(config.viewport_width, DEFAULT_WIDTH);
        assert_eq!(config.frame_interval_ms, 1);
        assert_eq!(config.clear_color, [0, 0, 0, 255]);
        assert_eq!(config.max_script_depth, 1);
    }

    #[test]
    fn json_fills_missing_fields() {
        let config =
            DriverConfig::from_json(r#"{ "viewport_width": 0, "clear_color": [1, 2, 3, 4] }"#).unwrap();
        assert_eq!(config.viewport_width, 1);
        assert_eq!(config.viewport_height, DEFAULT_HEIGHT);
        assert_eq!(config.clear_color(), Color::rgba(1, 2, 3, 4));
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            DriverConfig::from_json(r#"{ "viewport_width": "wide" }"#),
            Err(DriverError::Config(_))
        ));
    }
}
