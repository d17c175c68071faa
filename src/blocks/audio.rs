//! Audio block primitives: start, play, and tune sounds.
//!
//! `start*` variants are non-blocking and gated by the target's slot
//! counter; once the counter hits zero further starts are silently dropped.
//! `play*` variants follow the same two-call blocking convention as video:
//! queue + park on first entry, complete when the play has left the queue.

use crate::core::play_queue::AudioPlay;
use crate::entities::audio_target::AudioTarget;
use crate::entities::thread::ThreadStatus;

use super::BlockUtil;

/// Shared blocking-play template for sounds.
fn blocking_audio_play(util: &mut BlockUtil, build: impl FnOnce(&AudioTarget) -> (f64, f64)) {
    if let Some(play_id) = util.stack_frame().playing_id {
        if util.runtime.audio_state.playing.contains_key(&play_id) {
            util.thread.status = ThreadStatus::YieldTick;
        }
        // Play finished (or cancelled by stop-all): the block completes.
        return;
    }

    let Some(audio) = util.audio_target() else {
        return;
    };
    let (start, end) = build(audio);
    let play = AudioPlay::new(
        audio.id,
        audio.sample_rate,
        start,
        end,
        audio.playback_rate,
        true,
    );
    let play_id = util.runtime.audio_state.insert_play(play);
    util.stack_frame_mut().playing_id = Some(play_id);
    util.thread.status = ThreadStatus::YieldTick;
}

/// Queue a non-blocking play over `(start, end)` if a slot is free.
fn start_nonblocking(util: &mut BlockUtil, build: impl FnOnce(&AudioTarget) -> (f64, f64)) {
    let Some(audio) = util.audio_target() else {
        return;
    };
    if audio.nonblocking_sounds_available == 0 {
        // Out of slots: silently drop the start.
        return;
    }
    let (start, end) = build(audio);
    let play = AudioPlay::new(
        audio.id,
        audio.sample_rate,
        start,
        end,
        audio.playback_rate,
        false,
    );
    util.runtime.audio_state.insert_play(play);
    if let Some(audio) = util.audio_target_mut() {
        audio.nonblocking_sounds_available -= 1;
    }
}

/// Start the whole trim window, non-blocking.
pub fn start_sound(util: &mut BlockUtil) {
    start_nonblocking(util, |audio| (audio.trim_start, audio.trim_end));
}

/// Start a sample range, non-blocking. The range is clamped into the trim
/// window; a reversed range degenerates to an empty play.
pub fn start_sound_from_a_to_b(util: &mut BlockUtil, a: f64, b: f64) {
    start_nonblocking(util, |audio| clamp_range(audio, a, b));
}

/// Play the whole trim window, blocking until the sound finishes.
pub fn play_sound(util: &mut BlockUtil) {
    blocking_audio_play(util, |audio| (audio.trim_start, audio.trim_end));
}

/// Play a sample range, blocking.
pub fn play_sound_from_a_to_b(util: &mut BlockUtil, a: f64, b: f64) {
    blocking_audio_play(util, |audio| clamp_range(audio, a, b));
}

fn clamp_range(audio: &AudioTarget, a: f64, b: f64) -> (f64, f64) {
    let start = a.clamp(audio.trim_start, audio.trim_end);
    let end = b.clamp(audio.trim_start, audio.trim_end).max(start);
    (start, end)
}

// === Rate and volume ===

pub fn set_play_rate(util: &mut BlockUtil, rate: f64) {
    if let Some(audio) = util.audio_target_mut() {
        audio.set_rate(rate);
    }
}

pub fn change_play_rate_by(util: &mut BlockUtil, delta: f64) {
    if let Some(audio) = util.audio_target_mut() {
        audio.set_rate(audio.playback_rate + delta);
    }
}

pub fn set_volume_to(util: &mut BlockUtil, volume: f64) {
    if let Some(audio) = util.audio_target_mut() {
        audio.set_volume(volume);
    }
}

pub fn change_volume_by(util: &mut BlockUtil, delta: f64) {
    if let Some(audio) = util.audio_target_mut() {
        audio.set_volume(audio.volume + delta);
    }
}

pub fn get_volume(util: &BlockUtil) -> f64 {
    util.audio_target().map(|a| a.volume).unwrap_or(0.0)
}

pub fn get_play_rate(util: &BlockUtil) -> f64 {
    util.audio_target().map(|a| a.playback_rate).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::play_queue::advance_audio_plays;
    use crate::core::runtime::Runtime;
    use crate::entities::audio_target::{AudioTarget, MAX_NONBLOCKING_SOUNDS};
    use crate::entities::thread::Thread;
    use uuid::Uuid;

    const STEP_MS: f64 = 1000.0 / 30.0;

    fn fixture() -> (Runtime, Thread, Uuid) {
        let mut runtime = Runtime::new(STEP_MS).unwrap();
        let target = runtime.add_target(AudioTarget::new(48_000, 48_000.0));
        let thread = Thread::new(Uuid::new_v4(), target);
        (runtime, thread, target)
    }

    #[test]
    fn test_start_sound_consumes_slots_and_drops_overflow() {
        let (mut runtime, mut thread, target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        // 30 starts in one tick: 25 queue, the rest silently drop
        for _ in 0..30 {
            start_sound(&mut util);
        }
        assert_eq!(
            util.runtime.audio_state.playing.len(),
            MAX_NONBLOCKING_SOUNDS as usize
        );
        assert_eq!(
            util.audio_target().unwrap().nonblocking_sounds_available,
            0
        );
        assert_eq!(
            util.runtime.audio_state.nonblocking_count(target),
            MAX_NONBLOCKING_SOUNDS as usize
        );
        // none of the starts yielded
        assert_eq!(util.thread.status, ThreadStatus::Running);
    }

    #[test]
    fn test_slot_refund_restores_capacity() {
        let (mut runtime, mut thread, target) = fixture();
        {
            let mut util = BlockUtil::new(&mut runtime, &mut thread);
            start_sound_from_a_to_b(&mut util, 0.0, 100.0);
            assert_eq!(
                util.audio_target().unwrap().nonblocking_sounds_available,
                MAX_NONBLOCKING_SOUNDS - 1
            );
        }

        // run the short play out: saturate at end, rest one tick, remove
        for _ in 0..3 {
            advance_audio_plays(&mut runtime.audio_state, &mut runtime.targets, STEP_MS);
        }
        assert!(runtime.audio_state.playing.is_empty());
        assert_eq!(
            runtime
                .get_target_by_id(target)
                .unwrap()
                .as_audio()
                .unwrap()
                .nonblocking_sounds_available,
            MAX_NONBLOCKING_SOUNDS
        );
    }

    #[test]
    fn test_play_sound_blocks_until_removed() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        play_sound_from_a_to_b(&mut util, 0.0, 1000.0);
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);
        let play_id = util.stack_frame().playing_id.unwrap();
        assert!(util.runtime.audio_state.playing.contains_key(&play_id));

        // still queued: parks again
        util.thread.status = ThreadStatus::Running;
        play_sound_from_a_to_b(&mut util, 0.0, 1000.0);
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);

        // queue cleared (stop-all path): block completes
        util.runtime.audio_state.playing.clear();
        util.thread.status = ThreadStatus::Running;
        play_sound_from_a_to_b(&mut util, 0.0, 1000.0);
        assert_eq!(util.thread.status, ThreadStatus::Running);
    }

    #[test]
    fn test_blocking_play_ignores_slot_counter() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        util.audio_target_mut().unwrap().nonblocking_sounds_available = 0;

        play_sound(&mut util);
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);
        assert_eq!(util.runtime.audio_state.playing.len(), 1);
    }

    #[test]
    fn test_range_is_trim_bounded() {
        let (mut runtime, mut thread, _target) = fixture();
        {
            let audio = runtime.targets[0].as_audio_mut().unwrap();
            audio.set_trim(1000.0, 40_000.0);
        }
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        start_sound_from_a_to_b(&mut util, 0.0, 99_000.0);
        let play = util.runtime.audio_state.playing.values().next().unwrap();
        assert_eq!(play.start, 1000.0);
        assert_eq!(play.end, 40_000.0);
    }

    #[test]
    fn test_rate_and_volume_primitives_clamp() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        set_play_rate(&mut util, -50.0);
        assert_eq!(get_play_rate(&util), 0.0);
        change_play_rate_by(&mut util, 1500.0);
        assert_eq!(get_play_rate(&util), 1000.0);

        set_volume_to(&mut util, 200.0);
        change_volume_by(&mut util, 1000.0);
        assert_eq!(get_volume(&util), 500.0);
        change_volume_by(&mut util, -600.0);
        assert_eq!(get_volume(&util), 0.0);
    }

    #[test]
    fn test_sound_rate_snapshot_at_start() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        set_play_rate(&mut util, 200.0);
        start_sound(&mut util);
        set_play_rate(&mut util, 50.0);

        let play = util.runtime.audio_state.playing.values().next().unwrap();
        assert_eq!(play.playback_rate, 200.0);
    }
}
