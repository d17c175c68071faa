//! TargetKind - enum wrapper for all target types.
//!
//! Provides a unified interface for storing video and audio targets in the
//! runtime's target list, with typed accessors for the code paths that only
//! make sense for one kind.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audio_target::AudioTarget;
use super::video_target::VideoTarget;

/// Enum containing all possible target types.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TargetKind {
    Video(VideoTarget),
    Audio(AudioTarget),
}

impl TargetKind {
    /// Stable target id.
    pub fn id(&self) -> Uuid {
        match self {
            TargetKind::Video(t) => t.id,
            TargetKind::Audio(t) => t.id,
        }
    }

    /// Type identifier string ("Video" or "Audio").
    pub fn target_type(&self) -> &'static str {
        match self {
            TargetKind::Video(_) => "Video",
            TargetKind::Audio(_) => "Audio",
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, TargetKind::Video(_))
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, TargetKind::Audio(_))
    }

    pub fn as_video(&self) -> Option<&VideoTarget> {
        match self {
            TargetKind::Video(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoTarget> {
        match self {
            TargetKind::Video(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioTarget> {
        match self {
            TargetKind::Audio(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_audio_mut(&mut self) -> Option<&mut AudioTarget> {
        match self {
            TargetKind::Audio(t) => Some(t),
            _ => None,
        }
    }

    /// Re-establish runtime invariants after deserialization.
    pub fn normalize_after_load(&mut self) {
        match self {
            TargetKind::Video(t) => t.normalize_after_load(),
            TargetKind::Audio(t) => t.normalize_after_load(),
        }
    }
}

impl From<VideoTarget> for TargetKind {
    fn from(target: VideoTarget) -> Self {
        TargetKind::Video(target)
    }
}

impl From<AudioTarget> for TargetKind {
    fn from(target: AudioTarget) -> Self {
        TargetKind::Audio(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_video() {
        let video = VideoTarget::new(30.0, 300);
        let id = video.id;
        let kind: TargetKind = video.into();

        assert!(kind.is_video());
        assert!(!kind.is_audio());
        assert_eq!(kind.target_type(), "Video");
        assert_eq!(kind.id(), id);
        assert!(kind.as_video().is_some());
        assert!(kind.as_audio().is_none());
    }

    #[test]
    fn test_target_kind_audio() {
        let audio = AudioTarget::new(48_000, 48_000.0);
        let kind: TargetKind = audio.into();

        assert!(kind.is_audio());
        assert_eq!(kind.target_type(), "Audio");
        assert!(kind.as_audio().is_some());
    }
}
