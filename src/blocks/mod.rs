//! Script-visible block primitives.
//!
//! Primitives receive a [`BlockUtil`]: the runtime plus the executing
//! thread, with accessors for the pieces most primitives touch (owning
//! target, top stack frame). The host's block executor dispatches opcodes
//! to these functions.

pub mod audio;
pub mod metadata;
pub mod motion;
pub mod video;

use uuid::Uuid;

use crate::core::runtime::Runtime;
use crate::entities::audio_target::AudioTarget;
use crate::entities::thread::{StackFrame, Thread};
use crate::entities::video_target::VideoTarget;

/// Execution context handed to every block primitive: the shared runtime
/// and the thread the block runs on.
pub struct BlockUtil<'a> {
    pub runtime: &'a mut Runtime,
    pub thread: &'a mut Thread,
}

impl<'a> BlockUtil<'a> {
    pub fn new(runtime: &'a mut Runtime, thread: &'a mut Thread) -> Self {
        Self { runtime, thread }
    }

    /// Id of the thread's owning target.
    pub fn target_id(&self) -> Uuid {
        self.thread.target
    }

    /// The owning target as a video target, if it is one.
    pub fn video_target(&self) -> Option<&VideoTarget> {
        self.runtime
            .get_target_by_id(self.thread.target)
            .and_then(|t| t.as_video())
    }

    pub fn video_target_mut(&mut self) -> Option<&mut VideoTarget> {
        self.runtime
            .get_target_by_id_mut(self.thread.target)
            .and_then(|t| t.as_video_mut())
    }

    /// The owning target as an audio target, if it is one.
    pub fn audio_target(&self) -> Option<&AudioTarget> {
        self.runtime
            .get_target_by_id(self.thread.target)
            .and_then(|t| t.as_audio())
    }

    pub fn audio_target_mut(&mut self) -> Option<&mut AudioTarget> {
        self.runtime
            .get_target_by_id_mut(self.thread.target)
            .and_then(|t| t.as_audio_mut())
    }

    /// Top stack frame of the executing thread.
    pub fn stack_frame(&self) -> &StackFrame {
        self.thread.peek_frame()
    }

    pub fn stack_frame_mut(&mut self) -> &mut StackFrame {
        self.thread.peek_frame_mut()
    }
}
