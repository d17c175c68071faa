//! Video block primitives: start, stop, seek, and query playback.
//!
//! Blocking plays use a two-call convention. On first entry the primitive
//! queues a play, remembers its id on the top stack frame, and parks the
//! thread in `YieldTick`. Each following tick re-enters the primitive: if
//! the remembered play is still live it parks again; if the play is gone
//! (finished, overwritten, or stopped) the primitive returns without
//! yielding and the thread moves past the block. A stale play id is
//! therefore treated as successful completion.
//!
//! Script-facing frame numbers are 1-indexed relative to the trim window;
//! internal playheads are 0-indexed clip frames.

use crate::core::play_queue::VideoPlay;
use crate::entities::thread::ThreadStatus;
use crate::entities::video_target::VideoTarget;

use super::BlockUtil;

/// Shared blocking-play template. `build` seeks as needed and returns
/// `(from, to, forced)` for the play to queue.
fn blocking_video_play(
    util: &mut BlockUtil,
    build: impl FnOnce(&mut VideoTarget) -> (f64, f64, bool),
) {
    let target_id = util.target_id();

    if let Some(play_id) = util.stack_frame().playing_id {
        if util.runtime.video_state.play_is_live(target_id, play_id) {
            util.thread.status = ThreadStatus::YieldTick;
        }
        // Play gone or superseded: the block completes.
        return;
    }

    let (from, to, forced) = {
        let Some(video) = util.video_target_mut() else {
            return;
        };
        build(video)
    };
    let play = VideoPlay::new(from, to, Some(util.thread.top_block), true, forced);
    let play_id = util.runtime.video_state.insert_play(target_id, play);
    util.runtime.request_redraw();
    util.stack_frame_mut().playing_id = Some(play_id);
    util.thread.status = ThreadStatus::YieldTick;
}

/// Play the whole trim window from its start, blocking.
pub fn play_entire_until_done(util: &mut BlockUtil) {
    blocking_video_play(util, |video| {
        video.set_current_frame(video.trim_start);
        (video.trim_start, video.trim_end, false)
    });
}

/// Play from frame `a` to frame `b` (internal frame numbers), blocking.
/// A negative playback rate walks the play back to `a`.
pub fn play_from_a_to_b(util: &mut BlockUtil, a: f64, b: f64) {
    blocking_video_play(util, |video| {
        let a = a.clamp(video.trim_start, video.trim_end);
        let b = b.clamp(video.trim_start, video.trim_end);
        video.set_current_frame(a);
        (a, b, false)
    });
}

/// Play from the current frame to a trim bound, blocking. Direction is
/// forced: the magnitude of the rate applies either way.
pub fn play_forward_reverse_until_done(util: &mut BlockUtil, forward: bool) {
    blocking_video_play(util, |video| {
        let to = if forward {
            video.trim_end
        } else {
            video.trim_start
        };
        (video.current_frame, to, true)
    });
}

pub fn play_forward_until_done(util: &mut BlockUtil) {
    play_forward_reverse_until_done(util, true);
}

pub fn play_backward_until_done(util: &mut BlockUtil) {
    play_forward_reverse_until_done(util, false);
}

/// Start a non-blocking play toward a trim bound. Does not yield.
pub fn start_playing_forward_reverse(util: &mut BlockUtil, forward: bool) {
    let target_id = util.target_id();
    let Some(video) = util.video_target() else {
        return;
    };
    let to = if forward {
        video.trim_end
    } else {
        video.trim_start
    };
    let play = VideoPlay::new(video.current_frame, to, None, false, true);
    util.runtime.video_state.insert_play(target_id, play);
}

pub fn start_playing(util: &mut BlockUtil) {
    start_playing_forward_reverse(util, true);
}

/// Freeze the target's playhead by dropping its queued play.
pub fn stop_playing(util: &mut BlockUtil) {
    let target_id = util.target_id();
    util.runtime.video_state.remove_play(target_id);
}

/// Play `n` frames from the current position, blocking. The end bound is
/// clamped into the trim window; `n = 0` completes on the next tick.
pub fn play_n_frames(util: &mut BlockUtil, n: f64) {
    blocking_video_play(util, |video| {
        let from = video.current_frame;
        let to = (from + n).clamp(video.trim_start, video.trim_end);
        (from, to, false)
    });
}

/// Seek to a 1-indexed frame within the trim window.
pub fn go_to_frame(util: &mut BlockUtil, frame: f64) {
    if let Some(video) = util.video_target_mut() {
        let internal = (frame + video.trim_start) - 1.0;
        video.set_current_frame(internal);
        util.runtime.request_redraw();
    }
}

pub fn next_frame(util: &mut BlockUtil) {
    if let Some(video) = util.video_target_mut() {
        video.set_current_frame(video.current_frame + 1.0);
        util.runtime.request_redraw();
    }
}

pub fn previous_frame(util: &mut BlockUtil) {
    if let Some(video) = util.video_target_mut() {
        video.set_current_frame(video.current_frame - 1.0);
        util.runtime.request_redraw();
    }
}

// === Rate ===

pub fn set_play_rate(util: &mut BlockUtil, rate: f64) {
    if let Some(video) = util.video_target_mut() {
        video.set_rate(rate);
    }
}

pub fn change_play_rate_by(util: &mut BlockUtil, delta: f64) {
    if let Some(video) = util.video_target_mut() {
        video.set_rate(video.playback_rate + delta);
    }
}

// === Effects ===

pub fn set_effect_to(util: &mut BlockUtil, effect: &str, value: f64) {
    if let Some(video) = util.video_target_mut() {
        video.set_effect(effect, value);
        util.runtime.request_redraw();
    }
}

pub fn change_effect_by(util: &mut BlockUtil, effect: &str, delta: f64) {
    if let Some(video) = util.video_target_mut() {
        let current = video.effect(effect);
        video.set_effect(effect, current + delta);
        util.runtime.request_redraw();
    }
}

pub fn clear_video_effects(util: &mut BlockUtil) {
    if let Some(video) = util.video_target_mut() {
        video.clear_effects();
        util.runtime.request_redraw();
    }
}

// === Hats ===

/// True once per arrival at the trim end.
pub fn when_played_to_end(util: &BlockUtil) -> bool {
    util.video_target()
        .map(|v| v.current_frame == v.trim_end)
        .unwrap_or(false)
}

pub fn when_played_to_beginning(util: &BlockUtil) -> bool {
    util.video_target()
        .map(|v| v.current_frame == v.trim_start)
        .unwrap_or(false)
}

/// True while the playhead sits exactly on `marker`.
pub fn when_reached(util: &BlockUtil, marker: f64) -> bool {
    util.video_target()
        .map(|v| v.current_frame == marker)
        .unwrap_or(false)
}

/// Observes and consumes the tap latch.
pub fn when_tapped(util: &mut BlockUtil) -> bool {
    util.video_target_mut()
        .map(|v| v.consume_tapped())
        .unwrap_or(false)
}

// === Reporters ===

/// 1-indexed frame position within the trim window.
pub fn get_current_frame(util: &BlockUtil) -> f64 {
    util.video_target()
        .map(|v| (v.current_frame - v.trim_start) + 1.0)
        .unwrap_or(0.0)
}

/// Length of the trim window in frames.
pub fn get_total_frames(util: &BlockUtil) -> f64 {
    util.video_target()
        .map(|v| v.trim_end - v.trim_start)
        .unwrap_or(0.0)
}

pub fn get_play_rate(util: &BlockUtil) -> f64 {
    util.video_target().map(|v| v.playback_rate).unwrap_or(0.0)
}

/// Reads the tap latch without consuming it.
pub fn is_tapped(util: &BlockUtil) -> bool {
    util.video_target().map(|v| v.tapped).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::play_queue::advance_video_plays;
    use crate::core::runtime::Runtime;
    use crate::entities::thread::Thread;
    use uuid::Uuid;

    const STEP_MS: f64 = 1000.0 / 30.0;

    fn fixture() -> (Runtime, Thread, Uuid) {
        let mut runtime = Runtime::new(STEP_MS).unwrap();
        let target = runtime.add_target(VideoTarget::new(30.0, 300));
        let thread = Thread::new(Uuid::new_v4(), target);
        (runtime, thread, target)
    }

    fn advance(runtime: &mut Runtime) -> usize {
        let result = advance_video_plays(
            &mut runtime.video_state,
            &mut runtime.targets,
            runtime.current_step_time,
        );
        result.finished.len()
    }

    #[test]
    fn test_blocking_play_first_and_subsequent_entries() {
        let (mut runtime, mut thread, target) = fixture();
        runtime
            .get_target_by_id_mut(target)
            .unwrap()
            .as_video_mut()
            .unwrap()
            .set_current_frame(42.0);

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        play_entire_until_done(&mut util);

        // first entry: playhead reset to trim start, play queued, parked
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);
        let play_id = util.stack_frame().playing_id.expect("play id stored");
        assert!(util.runtime.video_state.play_is_live(target, play_id));
        assert_eq!(util.video_target().unwrap().current_frame, 0.0);

        // play still live: parks again
        util.thread.status = ThreadStatus::Running;
        play_entire_until_done(&mut util);
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);

        // play removed: block completes without yielding
        util.runtime.video_state.remove_play(target);
        util.thread.status = ThreadStatus::Running;
        play_entire_until_done(&mut util);
        assert_eq!(util.thread.status, ThreadStatus::Running);
    }

    #[test]
    fn test_overwrite_makes_first_caller_complete() {
        // two threads race: the second insertion supersedes the first
        let (mut runtime, mut thread_a, target) = fixture();
        let mut thread_b = Thread::new(Uuid::new_v4(), target);

        let mut util = BlockUtil::new(&mut runtime, &mut thread_a);
        play_entire_until_done(&mut util);
        let first_id = util.stack_frame().playing_id.unwrap();

        let mut util = BlockUtil::new(&mut runtime, &mut thread_b);
        play_entire_until_done(&mut util);
        let second_id = util.stack_frame().playing_id.unwrap();
        assert_ne!(first_id, second_id);

        // thread A wakes, sees a stale id, completes immediately
        thread_a.status = ThreadStatus::Running;
        let mut util = BlockUtil::new(&mut runtime, &mut thread_a);
        play_entire_until_done(&mut util);
        assert_eq!(util.thread.status, ThreadStatus::Running);

        // thread B's play is untouched
        assert!(runtime.video_state.play_is_live(target, second_id));
    }

    #[test]
    fn test_play_n_frames_zero_completes_next_tick() {
        let (mut runtime, mut thread, target) = fixture();
        runtime
            .get_target_by_id_mut(target)
            .unwrap()
            .as_video_mut()
            .unwrap()
            .set_current_frame(10.0);

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        play_n_frames(&mut util, 0.0);
        assert_eq!(util.thread.status, ThreadStatus::YieldTick);

        // the very first advancement completes the zero-length play
        assert_eq!(advance(&mut runtime), 1);

        thread.status = ThreadStatus::Running;
        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        play_n_frames(&mut util, 0.0);
        assert_eq!(util.thread.status, ThreadStatus::Running);
    }

    #[test]
    fn test_play_n_frames_clamps_end_into_trim() {
        let (mut runtime, mut thread, target) = fixture();
        {
            let video = runtime
                .get_target_by_id_mut(target)
                .unwrap()
                .as_video_mut()
                .unwrap();
            video.set_trim(0.0, 100.0);
            video.set_current_frame(90.0);
        }

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        play_n_frames(&mut util, 50.0);
        let play = &runtime.video_state.playing[&target];
        assert_eq!(play.end, 100.0);
    }

    #[test]
    fn test_start_and_stop_playing() {
        let (mut runtime, mut thread, target) = fixture();

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        start_playing(&mut util);
        // non-blocking: no yield, no play id on the frame
        assert_eq!(util.thread.status, ThreadStatus::Running);
        assert!(util.stack_frame().playing_id.is_none());
        assert!(util.runtime.video_state.playing.contains_key(&target));

        // scenario: ~3 ticks of playback then stop freezes the playhead
        for _ in 0..3 {
            advance(&mut runtime);
        }
        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        stop_playing(&mut util);
        assert!(!runtime.video_state.playing.contains_key(&target));
        let frame = runtime
            .get_target_by_id(target)
            .unwrap()
            .as_video()
            .unwrap()
            .current_frame;
        assert!((frame - 3.0).abs() < 1e-4);
        advance(&mut runtime);
        let frozen = runtime
            .get_target_by_id(target)
            .unwrap()
            .as_video()
            .unwrap()
            .current_frame;
        assert_eq!(frozen, frame);
    }

    #[test]
    fn test_forced_backward_reaches_trim_start() {
        let (mut runtime, mut thread, target) = fixture();
        runtime
            .get_target_by_id_mut(target)
            .unwrap()
            .as_video_mut()
            .unwrap()
            .set_current_frame(2.0);

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        play_backward_until_done(&mut util);

        advance(&mut runtime); // -> 1.0
        assert_eq!(advance(&mut runtime), 1); // reaches 0, play done
        let frame = runtime
            .get_target_by_id(target)
            .unwrap()
            .as_video()
            .unwrap()
            .current_frame;
        assert_eq!(frame, 0.0);
    }

    #[test]
    fn test_go_to_frame_is_one_indexed() {
        let (mut runtime, mut thread, target) = fixture();
        {
            let video = runtime
                .get_target_by_id_mut(target)
                .unwrap()
                .as_video_mut()
                .unwrap();
            video.set_trim(10.0, 200.0);
        }

        let mut util = BlockUtil::new(&mut runtime, &mut thread);
        go_to_frame(&mut util, 1.0);
        assert_eq!(util.video_target().unwrap().current_frame, 10.0);

        go_to_frame(&mut util, 5.0);
        assert_eq!(util.video_target().unwrap().current_frame, 14.0);
        assert_eq!(get_current_frame(&util), 5.0);
    }

    #[test]
    fn test_next_previous_frame_clamp_at_clip_bounds() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        previous_frame(&mut util);
        assert_eq!(util.video_target().unwrap().current_frame, 0.0);
        next_frame(&mut util);
        assert_eq!(util.video_target().unwrap().current_frame, 1.0);
    }

    #[test]
    fn test_effects_and_reporters() {
        let (mut runtime, mut thread, _target) = fixture();
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        set_effect_to(&mut util, "ghost", 30.0);
        change_effect_by(&mut util, "ghost", 15.0);
        change_effect_by(&mut util, "nonsense", 15.0); // ignored
        assert_eq!(util.video_target().unwrap().effects.ghost, 45.0);

        clear_video_effects(&mut util);
        assert_eq!(util.video_target().unwrap().effects.ghost, 0.0);

        set_play_rate(&mut util, 250.0);
        assert_eq!(get_play_rate(&util), 250.0);
        change_play_rate_by(&mut util, 5000.0);
        assert_eq!(get_play_rate(&util), 1000.0);

        assert_eq!(get_total_frames(&util), 299.0);
    }

    #[test]
    fn test_hats_observe_playhead_and_tap() {
        let (mut runtime, mut thread, target) = fixture();
        {
            let video = runtime
                .get_target_by_id_mut(target)
                .unwrap()
                .as_video_mut()
                .unwrap();
            video.set_trim(0.0, 100.0);
            video.markers = vec![50.0];
        }
        let mut util = BlockUtil::new(&mut runtime, &mut thread);

        assert!(when_played_to_beginning(&util));
        assert!(!when_played_to_end(&util));

        util.video_target_mut().unwrap().set_current_frame(50.0);
        assert!(when_reached(&util, 50.0));
        assert!(!when_reached(&util, 51.0));

        util.video_target_mut().unwrap().set_current_frame(100.0);
        assert!(when_played_to_end(&util));

        util.video_target_mut().unwrap().tapped = true;
        assert!(is_tapped(&util));
        assert!(is_tapped(&util)); // reporter does not consume
        assert!(when_tapped(&mut util)); // hat does
        assert!(!is_tapped(&util));
        assert!(!when_tapped(&mut util));
    }
}
