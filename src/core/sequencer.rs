//! Per-tick cooperative scheduler.
//!
//! **Architecture**: one `step_threads()` call is one tick. The sequencer
//! walks the thread list in order, running each thread until it yields,
//! then repeats passes until every thread has yielded for the tick or the
//! work budget is spent. Media playheads advance once at the end of the
//! tick, from the same wall-clock step time.
//!
//! # Timing model
//!
//! Two budgets bound a tick: `WORK_TIME_FRACTION x current_step_time` caps
//! the whole thread-stepping phase, and `WARP_TIME_MS` caps any single
//! warp-mode burst inside `step_thread`. Both are fields so tests can
//! shrink them without sleeping for real tick periods.
//!
//! # Block execution
//!
//! The sequencer never interprets blocks. A host-provided `BlockExecutor`
//! runs one block per call, mutating the thread's stack and status; it also
//! answers the block-topology queries (`next_block`, branches, procedure
//! definitions) that stepping needs.

use log::trace;
use uuid::Uuid;

use crate::core::events::{AudioPlayFinishedEvent, VideoPlayFinishedEvent};
use crate::core::play_queue::{advance_audio_plays, advance_video_plays};
use crate::core::runtime::Runtime;
use crate::core::timer::Timer;
use crate::entities::thread::{Thread, ThreadStatus};

/// Fraction of the step period the thread loop may consume.
pub const WORK_TIME_FRACTION: f64 = 0.33;

/// Cap on a single warp-mode burst, in ms.
pub const WARP_TIME_MS: f64 = 500.0;

/// Host-side block program: executes one block at a time and answers the
/// topology queries the sequencer needs to walk scripts.
pub trait BlockExecutor {
    /// Run the block at the top of `thread`'s stack. May mutate the stack
    /// (branches, procedure calls) and the thread status (yields).
    fn execute(&mut self, runtime: &mut Runtime, thread: &mut Thread);

    /// The block following `block` in its script, if any.
    fn next_block(&self, block: Uuid) -> Option<Uuid>;

    /// First block of the procedure definition for `code`, if defined.
    fn procedure_definition(&self, code: &str) -> Option<Uuid> {
        let _ = code;
        None
    }

    /// Whether the procedure for `code` is declared warp ("run without
    /// screen refresh").
    fn procedure_is_warp(&self, code: &str) -> bool {
        let _ = code;
        false
    }
}

/// The cooperative thread sequencer.
pub struct Sequencer {
    /// Work budget as a fraction of the step period.
    pub work_fraction: f64,
    /// Warp burst cap in ms.
    pub warp_time_ms: f64,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            work_fraction: WORK_TIME_FRACTION,
            warp_time_ms: WARP_TIME_MS,
        }
    }

    /// Run one tick. Returns the threads that finished during it.
    ///
    /// Outer passes repeat while at least one thread is still running, the
    /// work budget holds, and (outside turbo mode) no redraw was requested.
    /// Threads parked in `YieldTick` are released on the first pass only,
    /// so a blocking primitive re-enters exactly once per tick.
    pub fn step_threads(
        &mut self,
        runtime: &mut Runtime,
        executor: &mut dyn BlockExecutor,
    ) -> Vec<Thread> {
        let work_budget_ms = self.work_fraction * runtime.current_step_time;
        let tick_timer = Timer::start();
        let mut ran_first_pass = false;
        let mut num_active = 0usize;

        while !runtime.threads.is_empty()
            && (!ran_first_pass || num_active > 0)
            && tick_timer.elapsed_ms() < work_budget_ms
            && (runtime.turbo_mode || !runtime.redraw_requested())
        {
            num_active = 0;
            let mut i = 0;
            while i < runtime.threads.len() {
                {
                    let thread = &mut runtime.threads[i];
                    if thread.is_finished() {
                        i += 1;
                        continue;
                    }
                    if thread.status == ThreadStatus::YieldTick && !ran_first_pass {
                        thread.status = ThreadStatus::Running;
                    }
                    if thread.status != ThreadStatus::Running
                        && thread.status != ThreadStatus::Yield
                    {
                        i += 1;
                        continue;
                    }
                }

                // Detach while stepping so primitives can freely reach the
                // rest of the thread list through the runtime.
                let mut thread = runtime.threads.remove(i);
                self.step_thread(runtime, &mut thread, executor);
                thread.warp_timer = None;

                let kills = runtime.take_kill_requests();
                if kills.contains(&thread.id) {
                    // Killed mid-step: not reinserted. The next thread has
                    // shifted into slot i, so the index stays put.
                    trace!("thread {} killed mid-step", thread.id);
                } else {
                    if thread.status == ThreadStatus::Running {
                        num_active += 1;
                    }
                    runtime.threads.insert(i, thread);
                    i += 1;
                }
                for kill in kills {
                    if let Some(j) = runtime.threads.iter().position(|t| t.id == kill) {
                        runtime.threads.remove(j);
                        if j < i {
                            i -= 1;
                        }
                    }
                }
            }
            ran_first_pass = true;
        }

        // Compact the list, preserving order; finished threads drain out.
        let mut finished = Vec::new();
        let mut retained = Vec::with_capacity(runtime.threads.len());
        for thread in runtime.threads.drain(..) {
            if thread.is_finished() {
                finished.push(thread);
            } else {
                retained.push(thread);
            }
        }
        runtime.threads = retained;

        if let Some(profiler) = runtime.profiler.as_mut() {
            profiler.record("sequencer.stepThreads", tick_timer.elapsed_ms());
        }

        self.step_media(runtime);
        finished
    }

    /// Advance both play queues by one step of wall time and publish
    /// completions. Runs after the thread loop, so plays queued this tick
    /// hold still until the next one.
    fn step_media(&mut self, runtime: &mut Runtime) {
        let media_timer = Timer::start();
        let step_ms = runtime.current_step_time;

        let video = advance_video_plays(&mut runtime.video_state, &mut runtime.targets, step_ms);
        if video.moved {
            runtime.request_redraw();
        }
        for done in video.finished {
            runtime.events.emit(VideoPlayFinishedEvent {
                target_id: done.target_id,
                play_id: done.play_id,
            });
        }

        let audio_finished =
            advance_audio_plays(&mut runtime.audio_state, &mut runtime.targets, step_ms);
        for done in audio_finished {
            runtime.events.emit(AudioPlayFinishedEvent {
                target_id: done.target_id,
                play_id: done.play_id,
            });
        }

        if let Some(profiler) = runtime.profiler.as_mut() {
            profiler.record("sequencer.stepMedia", media_timer.elapsed_ms());
        }
    }

    /// Run one thread until it yields, parks, finishes, or its warp budget
    /// runs out.
    pub fn step_thread(
        &mut self,
        runtime: &mut Runtime,
        thread: &mut Thread,
        executor: &mut dyn BlockExecutor,
    ) {
        let mut current_block = match thread.peek_stack() {
            Some(block) => block,
            None => return,
        };

        loop {
            let warp_mode = thread.peek_frame().warp_mode;
            if warp_mode && thread.warp_timer.is_none() {
                thread.warp_timer = Some(Timer::start());
            }

            if runtime.get_target_by_id(thread.target).is_none() {
                trace!("retiring thread {}: target gone", thread.id);
                thread.retire();
                return;
            }

            executor.execute(runtime, thread);
            if runtime.kill_requested(thread.id) {
                return;
            }

            match thread.status {
                ThreadStatus::Yield => {
                    thread.status = ThreadStatus::Running;
                    // Warp bursts re-execute in place until the cap trips.
                    if warp_mode && self.warp_elapsed_ms(thread) <= self.warp_time_ms {
                        continue;
                    }
                    return;
                }
                ThreadStatus::PromiseWait => return,
                ThreadStatus::YieldTick => return,
                ThreadStatus::Done => return,
                ThreadStatus::Running => {}
            }

            // No control flow happened: move to the following block.
            if thread.peek_stack() == Some(current_block) {
                let next = executor.next_block(current_block);
                thread.reuse_stack_for_next_block(next);
            }

            // Unwind exhausted stack levels.
            while thread.peek_stack().is_none() {
                thread.pop_stack();
                if thread.stack_is_empty() {
                    thread.status = ThreadStatus::Done;
                    return;
                }
                let frame = thread.peek_frame();
                if frame.waiting_reporter {
                    return;
                }
                if frame.is_loop {
                    if !frame.warp_mode || self.warp_elapsed_ms(thread) > self.warp_time_ms {
                        // Loop bottom: yield for this tick; the loop block
                        // stays on top and re-executes next pass.
                        return;
                    }
                    // Warp with budget left: re-execute the loop block now.
                    break;
                }
                let top = match thread.peek_stack() {
                    Some(block) => block,
                    None => continue,
                };
                let next = executor.next_block(top);
                thread.reuse_stack_for_next_block(next);
            }

            current_block = match thread.peek_stack() {
                Some(block) => block,
                None => return,
            };
        }
    }

    fn warp_elapsed_ms(&self, thread: &Thread) -> f64 {
        thread.warp_timer.map(|t| t.elapsed_ms()).unwrap_or(0.0)
    }

    /// Enter a C-block branch: mark the current frame as a loop frame when
    /// requested and push the branch head (or the empty-branch sentinel).
    pub fn step_to_branch(&self, thread: &mut Thread, branch: Option<Uuid>, is_loop: bool) {
        if thread.stack_is_empty() {
            return;
        }
        thread.peek_frame_mut().is_loop = is_loop;
        thread.push_stack(branch);
    }

    /// Enter a procedure call: push the definition, then either warp it,
    /// yield a recursive call, or yield outright when the warp budget is
    /// already spent.
    pub fn step_to_procedure(
        &self,
        thread: &mut Thread,
        executor: &dyn BlockExecutor,
        code: &str,
    ) {
        let Some(definition) = executor.procedure_definition(code) else {
            return;
        };
        let is_recursive =
            thread.peek_stack() == Some(definition) || thread.is_recursive_call(definition);
        thread.push_stack(Some(definition));

        if thread.peek_frame().warp_mode && self.warp_elapsed_ms(thread) > self.warp_time_ms {
            thread.status = ThreadStatus::Yield;
        } else if executor.procedure_is_warp(code) {
            thread.peek_frame_mut().warp_mode = true;
        } else if is_recursive {
            thread.status = ThreadStatus::Yield;
        }
    }
}
