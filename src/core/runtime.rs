//! Runtime services: targets, threads, play queues, motion, and the
//! per-tick flags the sequencer consumes.
//!
//! **Architecture**: the runtime owns all shared mutable state (targets,
//! thread list, play queues, draw order). Everything is mutated either from
//! the tick loop or from primitives running within it, so no locking is
//! needed; an embedding that adds real parallelism must serialize access
//! behind this single owner.

use anyhow::{ensure, Result};
use log::info;
use uuid::Uuid;

use crate::core::events::{EventBus, ProjectStopAllEvent};
use crate::core::play_queue::{AudioState, VideoState};
use crate::entities::audio_target::MAX_NONBLOCKING_SOUNDS;
use crate::entities::target::TargetKind;
use crate::entities::thread::Thread;

/// Device-motion sample, in degrees. Updated by the host's motion provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionState {
    pub pitch: f64,
    pub roll: f64,
    /// Compass heading in [0, 360).
    pub heading: f64,
}

/// One profiler record: a labelled span in milliseconds.
#[derive(Clone, Debug)]
pub struct ProfileRecord {
    pub label: &'static str,
    pub ms: f64,
}

/// Minimal START/STOP profiler. Enabled by the host when wanted.
#[derive(Clone, Debug, Default)]
pub struct Profiler {
    pub records: Vec<ProfileRecord>,
}

impl Profiler {
    pub fn record(&mut self, label: &'static str, ms: f64) {
        self.records.push(ProfileRecord { label, ms });
    }
}

/// The shared runtime a sequencer drives.
pub struct Runtime {
    /// All registered targets, in registration order.
    pub targets: Vec<TargetKind>,
    /// Live script threads, in scheduling order.
    pub threads: Vec<Thread>,
    pub video_state: VideoState,
    pub audio_state: AudioState,
    pub motion: MotionState,
    /// Nominal tick period in ms.
    pub current_step_time: f64,
    /// When set, the sequencer keeps stepping even after a redraw request.
    pub turbo_mode: bool,
    pub profiler: Option<Profiler>,
    pub events: EventBus,

    redraw_requested: bool,
    /// Thread ids whose kill was requested mid-tick; the sequencer is the
    /// single owner of the thread list and applies these between steps.
    kill_requests: Vec<Uuid>,
}

impl Runtime {
    /// Create a runtime with the given nominal step time in ms.
    pub fn new(current_step_time: f64) -> Result<Self> {
        ensure!(
            current_step_time.is_finite() && current_step_time > 0.0,
            "step time must be a positive duration in ms, got {current_step_time}"
        );
        Ok(Self {
            targets: Vec::new(),
            threads: Vec::new(),
            video_state: VideoState::default(),
            audio_state: AudioState::default(),
            motion: MotionState::default(),
            current_step_time,
            turbo_mode: false,
            profiler: None,
            events: EventBus::new(),
            redraw_requested: false,
            kill_requests: Vec::new(),
        })
    }

    // === Targets ===

    /// Register a target. Video targets also join the draw order.
    pub fn add_target(&mut self, target: impl Into<TargetKind>) -> Uuid {
        let target = target.into();
        let id = target.id();
        if target.is_video() {
            self.video_state.register_target(id);
        }
        self.targets.push(target);
        id
    }

    /// Remove a target, its draw-order slot, and its queued plays.
    pub fn remove_target(&mut self, id: Uuid) -> Option<TargetKind> {
        let idx = self.targets.iter().position(|t| t.id() == id)?;
        self.video_state.unregister_target(id);
        self.audio_state.playing.retain(|_, p| p.target_id != id);
        Some(self.targets.remove(idx))
    }

    pub fn get_target_by_id(&self, id: Uuid) -> Option<&TargetKind> {
        self.targets.iter().find(|t| t.id() == id)
    }

    pub fn get_target_by_id_mut(&mut self, id: Uuid) -> Option<&mut TargetKind> {
        self.targets.iter_mut().find(|t| t.id() == id)
    }

    // === Threads ===

    /// Start a new thread at `top_block` on `target`. Returns the thread id.
    pub fn push_thread(&mut self, top_block: Uuid, target: Uuid) -> Uuid {
        let thread = Thread::new(top_block, target);
        let id = thread.id;
        self.threads.push(thread);
        id
    }

    /// Request that a thread be stopped. Takes effect when the sequencer
    /// regains control; never mutates the thread list directly.
    pub fn stop_thread(&mut self, thread_id: Uuid) {
        if !self.kill_requests.contains(&thread_id) {
            self.kill_requests.push(thread_id);
        }
    }

    /// Whether a kill is pending for `thread_id`.
    pub fn kill_requested(&self, thread_id: Uuid) -> bool {
        self.kill_requests.contains(&thread_id)
    }

    /// Drain all pending kill requests.
    pub fn take_kill_requests(&mut self) -> Vec<Uuid> {
        std::mem::take(&mut self.kill_requests)
    }

    // === Redraw ===

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Cleared by the host after it has drawn a frame.
    pub fn clear_redraw(&mut self) {
        self.redraw_requested = false;
    }

    // === Stop all ===

    /// One-shot cancel: clear both play queues, reset every audio target's
    /// non-blocking slots, and broadcast the stop to subscribers.
    pub fn stop_all(&mut self) {
        let video_plays = self.video_state.playing.len();
        let audio_plays = self.audio_state.playing.len();
        self.video_state.playing.clear();
        self.audio_state.playing.clear();
        for target in self.targets.iter_mut().filter_map(TargetKind::as_audio_mut) {
            target.nonblocking_sounds_available = MAX_NONBLOCKING_SOUNDS;
        }
        info!(
            "stop all: cleared {} video and {} audio plays",
            video_plays, audio_plays
        );
        self.events.emit(ProjectStopAllEvent);
    }
}
