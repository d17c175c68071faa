//! Script threads: resumable block-program continuations.
//!
//! A thread is an ordered stack of block ids with a parallel stack of
//! frames. It is not an OS thread: the only suspension points are the
//! status values below, and the sequencer resumes it cooperatively each
//! tick. Block primitives persist per-invocation state (play ids, frame
//! targets) on the top stack frame.

use uuid::Uuid;

use crate::core::timer::Timer;

/// Execution status of a thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThreadStatus {
    /// Actively stepped by the sequencer.
    #[default]
    Running,
    /// Yielded; may be resumed within the same tick.
    Yield,
    /// Parked until the first inner pass of the next tick.
    YieldTick,
    /// Waiting on an external resolution (host promise).
    PromiseWait,
    /// Finished; drained from the thread list at tick end.
    Done,
}

/// One stack frame of a thread.
///
/// `warp_mode` is inherited by pushed frames; `playing_id`, `playing` and
/// `target_frame` are scratch slots owned by media block primitives and are
/// reset whenever the frame is reused for a sibling block.
#[derive(Clone, Debug, Default)]
pub struct StackFrame {
    pub warp_mode: bool,
    pub is_loop: bool,
    pub waiting_reporter: bool,
    pub playing_id: Option<Uuid>,
    pub playing: Option<bool>,
    pub target_frame: Option<f64>,
}

impl StackFrame {
    fn inheriting(warp_mode: bool) -> Self {
        Self {
            warp_mode,
            ..Self::default()
        }
    }

    /// Reset for reuse by the next block in the same stack position.
    /// Warp mode survives; everything block-local is cleared.
    fn reuse(&mut self) {
        let warp = self.warp_mode;
        *self = Self::inheriting(warp);
    }
}

/// A running script. `target` is the owning target's id; a vanished target
/// retires the thread.
#[derive(Clone, Debug)]
pub struct Thread {
    /// Stable identity, used for kill requests and list bookkeeping.
    pub id: Uuid,
    /// The hat/top block this thread was started from.
    pub top_block: Uuid,
    /// Owning target id.
    pub target: Uuid,
    /// Block stack. `None` is the empty-branch sentinel pushed by
    /// `step_to_branch` when a C-block has no body.
    stack: Vec<Option<Uuid>>,
    frames: Vec<StackFrame>,
    pub status: ThreadStatus,
    /// Started when a warp frame is first stepped; cleared after each
    /// sequencer step.
    pub warp_timer: Option<Timer>,
}

impl Thread {
    /// Create a thread positioned at `top_block`, owned by `target`.
    pub fn new(top_block: Uuid, target: Uuid) -> Self {
        let mut thread = Self {
            id: Uuid::new_v4(),
            top_block,
            target,
            stack: Vec::new(),
            frames: Vec::new(),
            status: ThreadStatus::Running,
            warp_timer: None,
        };
        thread.push_stack(Some(top_block));
        thread
    }

    /// Push a block (or the empty-branch sentinel). The new frame inherits
    /// warp mode from the frame below it.
    pub fn push_stack(&mut self, block: Option<Uuid>) {
        let warp = self.frames.last().map(|f| f.warp_mode).unwrap_or(false);
        self.stack.push(block);
        self.frames.push(StackFrame::inheriting(warp));
    }

    /// Pop the top block and its frame.
    pub fn pop_stack(&mut self) -> Option<Uuid> {
        self.frames.pop();
        self.stack.pop().flatten()
    }

    /// Top-of-stack block id; `None` when the stack is empty or the top is
    /// the empty-branch sentinel.
    pub fn peek_stack(&self) -> Option<Uuid> {
        self.stack.last().copied().flatten()
    }

    /// Whether the stack holds any entries (including sentinels).
    pub fn stack_is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Top stack frame. Panics only if the stack is empty, which the
    /// sequencer rules out before stepping.
    pub fn peek_frame(&self) -> &StackFrame {
        self.frames.last().expect("thread stack is empty")
    }

    pub fn peek_frame_mut(&mut self) -> &mut StackFrame {
        self.frames.last_mut().expect("thread stack is empty")
    }

    /// Replace the top of the stack with the following block, reusing the
    /// frame slot. Clears block-local scratch; keeps warp mode.
    pub fn reuse_stack_for_next_block(&mut self, next: Option<Uuid>) {
        if let Some(slot) = self.stack.last_mut() {
            *slot = next;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.reuse();
        }
    }

    /// True if `block` already appears below the top of the stack. Used for
    /// procedure recursion detection.
    pub fn is_recursive_call(&self, definition: Uuid) -> bool {
        let depth = self.stack.len();
        if depth < 2 {
            return false;
        }
        self.stack[..depth - 1]
            .iter()
            .any(|b| *b == Some(definition))
    }

    /// Clear the stack and mark the thread finished.
    pub fn retire(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.status = ThreadStatus::Done;
    }

    /// Whether this thread is already finished or has nothing left to run.
    pub fn is_finished(&self) -> bool {
        self.status == ThreadStatus::Done || self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_thread_starts_at_top_block() {
        let top = Uuid::new_v4();
        let thread = Thread::new(top, Uuid::new_v4());
        assert_eq!(thread.peek_stack(), Some(top));
        assert_eq!(thread.status, ThreadStatus::Running);
        assert!(!thread.peek_frame().warp_mode);
    }

    #[test]
    fn test_pushed_frame_inherits_warp() {
        let mut thread = Thread::new(Uuid::new_v4(), Uuid::new_v4());
        thread.peek_frame_mut().warp_mode = true;
        thread.push_stack(Some(Uuid::new_v4()));
        assert!(thread.peek_frame().warp_mode);
        thread.push_stack(None);
        assert!(thread.peek_frame().warp_mode);
        assert_eq!(thread.peek_stack(), None);
        assert!(!thread.stack_is_empty());
    }

    #[test]
    fn test_reuse_clears_primitive_scratch() {
        let mut thread = Thread::new(Uuid::new_v4(), Uuid::new_v4());
        {
            let frame = thread.peek_frame_mut();
            frame.warp_mode = true;
            frame.is_loop = true;
            frame.playing_id = Some(Uuid::new_v4());
            frame.playing = Some(true);
            frame.target_frame = Some(5.0);
        }
        let next = Uuid::new_v4();
        thread.reuse_stack_for_next_block(Some(next));
        assert_eq!(thread.peek_stack(), Some(next));
        let frame = thread.peek_frame();
        assert!(frame.warp_mode);
        assert!(!frame.is_loop);
        assert!(frame.playing_id.is_none());
        assert!(frame.playing.is_none());
        assert!(frame.target_frame.is_none());
    }

    #[test]
    fn test_recursion_detection() {
        let top = Uuid::new_v4();
        let definition = Uuid::new_v4();
        let mut thread = Thread::new(top, Uuid::new_v4());
        assert!(!thread.is_recursive_call(definition));
        thread.push_stack(Some(definition));
        // definition at top only: not yet recursive
        assert!(!thread.is_recursive_call(definition));
        thread.push_stack(Some(definition));
        assert!(thread.is_recursive_call(definition));
    }

    #[test]
    fn test_retire_empties_stack() {
        let mut thread = Thread::new(Uuid::new_v4(), Uuid::new_v4());
        thread.push_stack(Some(Uuid::new_v4()));
        thread.retire();
        assert!(thread.stack_is_empty());
        assert_eq!(thread.status, ThreadStatus::Done);
        assert!(thread.is_finished());
    }
}
