//! Play-queue state and per-tick playhead advancement.
//!
//! Two containers track what is audible/visible right now:
//! - `VideoState.playing`: at most one play per video target, keyed by
//!   target id. A new play for the same target overwrites the old one; a
//!   blocking caller of the old play detects the loss by its surviving
//!   play id (see `blocks::video`).
//! - `AudioState.playing`: many plays per audio target, keyed by play id.
//!   Non-blocking plays are bounded per target by its slot counter.
//!
//! Advancement runs once per tick, after thread stepping, from the same
//! wall-clock step time the sequencer budgeted with. A play queued during a
//! tick therefore does not move until the next tick.

use std::collections::HashMap;

use log::warn;
use uuid::Uuid;

use crate::entities::audio_target::MAX_NONBLOCKING_SOUNDS;
use crate::entities::target::TargetKind;

/// Travel direction of a video play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Backward,
}

impl PlayDirection {
    pub fn signum(self) -> f64 {
        match self {
            PlayDirection::Forward => 1.0,
            PlayDirection::Backward => -1.0,
        }
    }
}

/// An active video play. Bounds are normalized (`start <= end`); the travel
/// direction is carried separately.
///
/// `forced` plays (play forward / play backward and their non-blocking
/// variants) move in their stated direction regardless of the sign of the
/// target's playback rate; free plays (entire clip, A to B) reverse when
/// the rate is negative.
#[derive(Clone, Debug)]
pub struct VideoPlay {
    pub id: Uuid,
    pub start: f64,
    pub end: f64,
    /// Top block of the owning thread, for blocking plays.
    pub thread_top_block: Option<Uuid>,
    pub blocking: bool,
    pub direction: PlayDirection,
    pub forced: bool,
}

impl VideoPlay {
    /// Build a play travelling from `from` to `to`. Bounds are stored
    /// normalized; direction comes from the requested travel.
    pub fn new(
        from: f64,
        to: f64,
        thread_top_block: Option<Uuid>,
        blocking: bool,
        forced: bool,
    ) -> Self {
        let direction = if to >= from {
            PlayDirection::Forward
        } else {
            PlayDirection::Backward
        };
        Self {
            id: Uuid::new_v4(),
            start: from.min(to),
            end: from.max(to),
            thread_top_block,
            blocking,
            direction,
            forced,
        }
    }
}

/// An active audio play. Rate and sample rate are snapshot at start time;
/// later target edits do not retune a sound already in flight.
#[derive(Clone, Debug)]
pub struct AudioPlay {
    pub target_id: Uuid,
    pub sample_rate: f64,
    pub start: f64,
    pub end: f64,
    pub playback_rate: f64,
    pub prev_playhead: f64,
    pub playhead: f64,
    pub blocking: bool,
}

impl AudioPlay {
    pub fn new(target_id: Uuid, sample_rate: f64, start: f64, end: f64, playback_rate: f64, blocking: bool) -> Self {
        Self {
            target_id,
            sample_rate,
            start,
            end,
            playback_rate,
            prev_playhead: start,
            playhead: start,
            blocking,
        }
    }
}

/// Video-side shared state: active plays plus the global draw order.
#[derive(Clone, Debug, Default)]
pub struct VideoState {
    /// videoTargetId -> active play. At most one per target.
    pub playing: HashMap<Uuid, VideoPlay>,
    /// Draw order, back to front.
    pub order: Vec<Uuid>,
}

impl VideoState {
    /// Insert (or overwrite) the play for `target_id`. Returns the play id.
    pub fn insert_play(&mut self, target_id: Uuid, play: VideoPlay) -> Uuid {
        let play_id = play.id;
        self.playing.insert(target_id, play);
        play_id
    }

    pub fn remove_play(&mut self, target_id: Uuid) -> Option<VideoPlay> {
        self.playing.remove(&target_id)
    }

    /// Whether the play identified by `play_id` is still the live play for
    /// `target_id`. A later insertion makes earlier ids stale.
    pub fn play_is_live(&self, target_id: Uuid, play_id: Uuid) -> bool {
        self.playing
            .get(&target_id)
            .map(|p| p.id == play_id)
            .unwrap_or(false)
    }

    /// Register a target at the top of the draw order.
    pub fn register_target(&mut self, target_id: Uuid) {
        if !self.order.contains(&target_id) {
            self.order.push(target_id);
        }
    }

    /// Drop a target from the draw order and the play queue.
    pub fn unregister_target(&mut self, target_id: Uuid) {
        self.order.retain(|id| *id != target_id);
        self.playing.remove(&target_id);
    }

    fn order_index(&self, target_id: Uuid) -> Option<usize> {
        let idx = self.order.iter().position(|id| *id == target_id);
        if idx.is_none() {
            warn!("layer op on target {} not present in draw order", target_id);
        }
        idx
    }

    /// Move to the top of the draw order (drawn last).
    pub fn go_to_front(&mut self, target_id: Uuid) {
        if let Some(idx) = self.order_index(target_id) {
            self.order.remove(idx);
            self.order.push(target_id);
        }
    }

    /// Move to the bottom of the draw order (drawn first).
    pub fn go_to_back(&mut self, target_id: Uuid) {
        if let Some(idx) = self.order_index(target_id) {
            self.order.remove(idx);
            self.order.insert(0, target_id);
        }
    }

    /// Move `layers` steps toward the top, clamped.
    pub fn go_forward_layers(&mut self, target_id: Uuid, layers: i32) {
        self.shift_layers(target_id, layers as i64);
    }

    /// Move `layers` steps toward the bottom, clamped.
    pub fn go_backward_layers(&mut self, target_id: Uuid, layers: i32) {
        self.shift_layers(target_id, -(layers as i64));
    }

    fn shift_layers(&mut self, target_id: Uuid, delta: i64) {
        if let Some(idx) = self.order_index(target_id) {
            self.order.remove(idx);
            let new_idx = (idx as i64 + delta).clamp(0, self.order.len() as i64) as usize;
            self.order.insert(new_idx, target_id);
        }
    }
}

/// Audio-side shared state: active plays keyed by play id.
#[derive(Clone, Debug, Default)]
pub struct AudioState {
    pub playing: HashMap<Uuid, AudioPlay>,
}

impl AudioState {
    /// Queue a play under a fresh id. Slot accounting is the caller's job.
    pub fn insert_play(&mut self, play: AudioPlay) -> Uuid {
        let play_id = Uuid::new_v4();
        self.playing.insert(play_id, play);
        play_id
    }

    /// Count of non-blocking plays currently in flight for one target.
    pub fn nonblocking_count(&self, target_id: Uuid) -> usize {
        self.playing
            .values()
            .filter(|p| p.target_id == target_id && !p.blocking)
            .count()
    }
}

/// A play that completed during advancement.
#[derive(Clone, Debug)]
pub struct FinishedPlay {
    pub target_id: Uuid,
    pub play_id: Uuid,
    pub blocking: bool,
}

/// Outcome of one video advancement pass.
#[derive(Debug, Default)]
pub struct VideoAdvance {
    pub finished: Vec<FinishedPlay>,
    /// True when any playhead moved; the runtime turns this into a redraw.
    pub moved: bool,
}

/// Advance every active video play by one step of `step_ms` wall time.
///
/// Per-play delta is `step_s x rate/100 x fps`, signed by the play's travel
/// direction; forced-direction plays use the magnitude of the target's rate,
/// free plays its signed value (a negative rate walks an A-to-B play back to
/// A). A play completes when the next playhead crosses the bound it is
/// travelling toward; the playhead clamps to that bound.
pub fn advance_video_plays(
    state: &mut VideoState,
    targets: &mut [TargetKind],
    step_ms: f64,
) -> VideoAdvance {
    let step_s = step_ms / 1000.0;
    let mut result = VideoAdvance::default();

    for (&target_id, play) in state.playing.iter() {
        let Some(target) = targets
            .iter_mut()
            .filter_map(TargetKind::as_video_mut)
            .find(|t| t.id == target_id)
        else {
            // Owning target is gone; retire the play.
            result.finished.push(FinishedPlay {
                target_id,
                play_id: play.id,
                blocking: play.blocking,
            });
            continue;
        };

        let rate = if play.forced {
            target.playback_rate.abs()
        } else {
            target.playback_rate
        };
        let delta = step_s * (rate / 100.0) * target.fps * play.direction.signum();
        let next = target.current_frame + delta;

        let toward_start = play.start > play.end || delta < 0.0;
        let toward_end = play.end > play.start || delta > 0.0;

        if toward_start && next <= play.start {
            target.set_current_frame(play.start);
            result.moved = true;
            result.finished.push(FinishedPlay {
                target_id,
                play_id: play.id,
                blocking: play.blocking,
            });
        } else if toward_end && next >= play.end {
            target.set_current_frame(play.end);
            result.moved = true;
            result.finished.push(FinishedPlay {
                target_id,
                play_id: play.id,
                blocking: play.blocking,
            });
        } else if delta != 0.0 {
            target.set_current_frame(next);
            result.moved = true;
        }
    }

    for finished in &result.finished {
        state.playing.remove(&finished.target_id);
    }
    result
}

/// Advance every active audio play by one step of `step_ms` wall time.
///
/// A play whose playhead already rests at its end sample is removed; live
/// plays move by `step_s x sample_rate x rate/100`, saturating at the end.
/// Removed non-blocking plays refund one slot to their owning target.
pub fn advance_audio_plays(
    state: &mut AudioState,
    targets: &mut [TargetKind],
    step_ms: f64,
) -> Vec<FinishedPlay> {
    let step_s = step_ms / 1000.0;
    let mut finished = Vec::new();

    for (&play_id, play) in state.playing.iter_mut() {
        if play.playhead >= play.end {
            finished.push(FinishedPlay {
                target_id: play.target_id,
                play_id,
                blocking: play.blocking,
            });
            continue;
        }
        let delta = step_s * play.sample_rate * (play.playback_rate / 100.0);
        let next = (play.playhead + delta).min(play.end);
        play.prev_playhead = play.playhead;
        play.playhead = next;
    }

    for done in &finished {
        state.playing.remove(&done.play_id);
        if !done.blocking {
            if let Some(target) = targets
                .iter_mut()
                .filter_map(TargetKind::as_audio_mut)
                .find(|t| t.id == done.target_id)
            {
                target.nonblocking_sounds_available =
                    (target.nonblocking_sounds_available + 1).min(MAX_NONBLOCKING_SOUNDS);
            }
        }
    }
    finished
}
