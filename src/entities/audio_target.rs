//! Audio targets: per-clip sample range, rate, volume, and markers.
//!
//! Unlike video, many plays of one audio clip may be in flight at once;
//! non-blocking plays are bounded by a per-target slot counter that the
//! play queue decrements on start and refunds on completion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cap on simultaneous non-blocking plays per audio target.
pub const MAX_NONBLOCKING_SOUNDS: u32 = 25;

/// Audio playback rate bounds, in percent. Reverse audio is not supported.
pub const AUDIO_RATE_MIN: f64 = 0.0;
pub const AUDIO_RATE_MAX: f64 = 1000.0;

/// Volume bounds, in percent.
pub const VOLUME_MIN: f64 = 0.0;
pub const VOLUME_MAX: f64 = 500.0;

/// An audio clip target.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTarget {
    pub id: Uuid,
    /// Percent; clamped to [0, 500].
    pub volume: f64,
    pub total_samples: u64,
    /// Hz. Recording default is 48 kHz.
    pub sample_rate: f64,
    #[serde(default)]
    pub blocks: serde_json::Value,
    #[serde(default)]
    pub variables: serde_json::Value,
    #[serde(default)]
    pub lists: serde_json::Value,
    /// User-authored sample positions, ordered ascending.
    #[serde(default)]
    pub markers: Vec<u64>,
    /// Playback window, within `[0, total_samples - 1]`.
    pub trim_start: f64,
    pub trim_end: f64,
    /// Percent; 100 is native speed.
    pub playback_rate: f64,

    /// Remaining non-blocking play slots. Runtime-only; full on load.
    #[serde(skip, default = "full_slots")]
    pub nonblocking_sounds_available: u32,
}

fn full_slots() -> u32 {
    MAX_NONBLOCKING_SOUNDS
}

impl AudioTarget {
    /// Create a target for a clip of `total_samples` samples.
    pub fn new(total_samples: u64, sample_rate: f64) -> Self {
        let total_samples = total_samples.max(1);
        Self {
            id: Uuid::new_v4(),
            volume: 100.0,
            total_samples,
            sample_rate,
            blocks: serde_json::Value::Object(Default::default()),
            variables: serde_json::Value::Object(Default::default()),
            lists: serde_json::Value::Object(Default::default()),
            markers: Vec::new(),
            trim_start: 0.0,
            trim_end: (total_samples - 1) as f64,
            playback_rate: 100.0,
            nonblocking_sounds_available: MAX_NONBLOCKING_SOUNDS,
        }
    }

    /// Last addressable sample index.
    pub fn max_sample(&self) -> f64 {
        (self.total_samples.max(1) - 1) as f64
    }

    /// Set volume in percent, clamped to [0, 500].
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(VOLUME_MIN, VOLUME_MAX);
    }

    /// Set playback rate in percent, clamped to [0, 1000].
    pub fn set_rate(&mut self, rate: f64) {
        self.playback_rate = rate.clamp(AUDIO_RATE_MIN, AUDIO_RATE_MAX);
    }

    /// Constrain the trim window to `[0, total_samples - 1]`, start <= end.
    pub fn set_trim(&mut self, start: f64, end: f64) {
        let max = self.max_sample();
        let start = start.clamp(0.0, max);
        let end = end.clamp(0.0, max);
        self.trim_start = start.min(end);
        self.trim_end = start.max(end);
    }

    /// Deep copy under a fresh id. The caller overwrites the id when a
    /// specific one is required (e.g. project import).
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.nonblocking_sounds_available = MAX_NONBLOCKING_SOUNDS;
        copy
    }

    /// Re-establish runtime invariants after deserialization.
    pub fn normalize_after_load(&mut self) {
        let max = self.max_sample();
        self.trim_start = self.trim_start.clamp(0.0, max);
        self.trim_end = self.trim_end.clamp(0.0, max);
        if self.trim_start > self.trim_end {
            std::mem::swap(&mut self.trim_start, &mut self.trim_end);
        }
        self.volume = self.volume.clamp(VOLUME_MIN, VOLUME_MAX);
        self.playback_rate = self.playback_rate.clamp(AUDIO_RATE_MIN, AUDIO_RATE_MAX);
        self.nonblocking_sounds_available = MAX_NONBLOCKING_SOUNDS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_and_rate_clamps() {
        let mut target = AudioTarget::new(48_000, 48_000.0);
        target.set_volume(600.0);
        assert_eq!(target.volume, 500.0);
        target.set_volume(-10.0);
        assert_eq!(target.volume, 0.0);
        target.set_rate(-100.0);
        assert_eq!(target.playback_rate, 0.0);
        target.set_rate(2000.0);
        assert_eq!(target.playback_rate, 1000.0);
    }

    #[test]
    fn test_duplicate_uses_fresh_id_and_copies_markers() {
        let mut target = AudioTarget::new(96_000, 48_000.0);
        target.markers = vec![100, 2_000, 50_000];
        target.set_trim(10.0, 90_000.0);
        target.nonblocking_sounds_available = 3;

        let copy = target.duplicate();
        assert_ne!(copy.id, target.id);
        assert_eq!(copy.markers, target.markers);
        assert_eq!(copy.trim_start, target.trim_start);
        assert_eq!(copy.trim_end, target.trim_end);
        assert_eq!(copy.nonblocking_sounds_available, MAX_NONBLOCKING_SOUNDS);
    }

    #[test]
    fn test_serde_round_trip_preserves_documented_fields() {
        let mut target = AudioTarget::new(96_000, 44_100.0);
        target.markers = vec![500, 40_000];
        target.set_trim(100.0, 80_000.0);
        target.set_volume(250.0);
        target.set_rate(50.0);
        target.nonblocking_sounds_available = 1;

        let json = serde_json::to_string(&target).unwrap();
        assert!(json.contains("\"totalSamples\""));
        assert!(json.contains("\"trimStart\""));

        let mut back: AudioTarget = serde_json::from_str(&json).unwrap();
        back.normalize_after_load();
        assert_eq!(back.id, target.id);
        assert_eq!(back.total_samples, 96_000);
        assert_eq!(back.sample_rate, 44_100.0);
        assert_eq!(back.markers, vec![500, 40_000]);
        assert_eq!(back.trim_start, 100.0);
        assert_eq!(back.trim_end, 80_000.0);
        assert_eq!(back.volume, 250.0);
        assert_eq!(back.playback_rate, 50.0);
        // slot counter is runtime state, never persisted
        assert_eq!(back.nonblocking_sounds_available, MAX_NONBLOCKING_SOUNDS);
    }
}
