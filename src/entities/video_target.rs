//! Video targets: per-clip playhead, trim range, rate, and visual state.
//!
//! A video target owns a recorded clip's playback state. The playhead
//! (`current_frame`) is fractional: advancement accumulates sub-frame
//! deltas from wall-clock step time. All setters clamp; out-of-range input
//! is absorbed here rather than surfaced to scripts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Playback rate bounds, in percent. Negative plays in reverse.
pub const VIDEO_RATE_MIN: f64 = -1000.0;
pub const VIDEO_RATE_MAX: f64 = 1000.0;

/// Size clamp bounds, in percent.
pub const SIZE_MIN: f64 = 1.0;
pub const SIZE_MAX: f64 = 500.0;

/// Graphic effect parameters applied by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoEffects {
    #[serde(default)]
    pub color: f64,
    #[serde(default)]
    pub whirl: f64,
    #[serde(default)]
    pub brightness: f64,
    #[serde(default)]
    pub ghost: f64,
}

/// A video clip target.
///
/// Persisted fields follow the project JSON contract; trim bounds and the
/// tap latch are runtime state, re-derived or reset on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTarget {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub direction: f64,
    pub visible: bool,
    #[serde(default)]
    pub effects: VideoEffects,
    /// Script blocks, opaque to the core (owned by the block storage).
    #[serde(default)]
    pub blocks: serde_json::Value,
    #[serde(default)]
    pub variables: serde_json::Value,
    #[serde(default)]
    pub lists: serde_json::Value,
    /// Native frame rate of the clip.
    pub fps: f64,
    /// Total recorded frames.
    pub frames: u32,
    /// Playhead, fractional, always within `[0, frames - 1]`.
    pub current_frame: f64,
    /// Percent; 100 is native speed.
    pub playback_rate: f64,

    /// Playback window, within `[0, frames - 1]`. Not persisted.
    #[serde(skip)]
    pub trim_start: f64,
    #[serde(skip)]
    pub trim_end: f64,
    /// Frame markers authored in the editor. Not persisted here.
    #[serde(skip)]
    pub markers: Vec<f64>,
    /// Latched on tap input, consumed by the "when tapped" hat.
    #[serde(skip)]
    pub tapped: bool,
}

impl VideoTarget {
    /// Create a target for a clip of `frames` frames at `fps`.
    pub fn new(fps: f64, frames: u32) -> Self {
        let frames = frames.max(1);
        Self {
            id: Uuid::new_v4(),
            x: 0.0,
            y: 0.0,
            size: 100.0,
            direction: 90.0,
            visible: true,
            effects: VideoEffects::default(),
            blocks: serde_json::Value::Object(Default::default()),
            variables: serde_json::Value::Object(Default::default()),
            lists: serde_json::Value::Object(Default::default()),
            fps,
            frames,
            current_frame: 0.0,
            playback_rate: 100.0,
            trim_start: 0.0,
            trim_end: (frames - 1) as f64,
            markers: Vec::new(),
            tapped: false,
        }
    }

    /// Last addressable frame index.
    pub fn max_frame(&self) -> f64 {
        (self.frames.max(1) - 1) as f64
    }

    /// Move the playhead, clamped to the clip bounds. The caller requests a
    /// redraw; this only mutates state.
    pub fn set_current_frame(&mut self, frame: f64) {
        self.current_frame = frame.clamp(0.0, self.max_frame());
    }

    /// Set playback rate in percent, clamped to [-1000, 1000].
    pub fn set_rate(&mut self, rate: f64) {
        self.playback_rate = rate.clamp(VIDEO_RATE_MIN, VIDEO_RATE_MAX);
    }

    /// Set a named effect. Unknown names are ignored.
    pub fn set_effect(&mut self, name: &str, value: f64) {
        match name {
            "color" => self.effects.color = value,
            "whirl" => self.effects.whirl = value,
            "brightness" => self.effects.brightness = value,
            "ghost" => self.effects.ghost = value,
            _ => {}
        }
    }

    /// Read a named effect; unknown names read as 0.
    pub fn effect(&self, name: &str) -> f64 {
        match name {
            "color" => self.effects.color,
            "whirl" => self.effects.whirl,
            "brightness" => self.effects.brightness,
            "ghost" => self.effects.ghost,
            _ => 0.0,
        }
    }

    /// Reset all effects to 0.
    pub fn clear_effects(&mut self) {
        self.effects = VideoEffects::default();
    }

    /// Set size in percent, clamped to [1, 500].
    pub fn set_size(&mut self, size: f64) {
        self.size = size.clamp(SIZE_MIN, SIZE_MAX);
    }

    /// Set heading in degrees, wrap-clamped to (-179, 180].
    pub fn set_direction(&mut self, direction: f64) {
        self.direction = wrap_clamp(direction, -179.0, 180.0);
    }

    /// Constrain the trim window to `[0, frames - 1]` with start <= end.
    pub fn set_trim(&mut self, start: f64, end: f64) {
        let max = self.max_frame();
        let start = start.clamp(0.0, max);
        let end = end.clamp(0.0, max);
        self.trim_start = start.min(end);
        self.trim_end = start.max(end);
    }

    /// Observe and consume the tap latch.
    pub fn consume_tapped(&mut self) -> bool {
        let was = self.tapped;
        self.tapped = false;
        was
    }

    /// Re-establish runtime invariants after deserialization: trim spans the
    /// whole clip, the playhead is inside the clip.
    pub fn normalize_after_load(&mut self) {
        self.trim_start = 0.0;
        self.trim_end = self.max_frame();
        self.current_frame = self.current_frame.clamp(0.0, self.max_frame());
        self.playback_rate = self.playback_rate.clamp(VIDEO_RATE_MIN, VIDEO_RATE_MAX);
        self.tapped = false;
    }
}

/// Wrap `value` into the half-open interval (`low`, `high`] the way sprite
/// headings do: 181 becomes -179, -180 becomes 180.
fn wrap_clamp(value: f64, low: f64, high: f64) -> f64 {
    let range = high - low + 1.0;
    (value - low).rem_euclid(range) + low
}
