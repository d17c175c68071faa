//! Core entities: targets, threads, and project persistence.
//! Data flow: block primitives and the sequencer mutate targets and play
//! queues; `Project` is the unit of serialization for the target pool.

pub mod audio_target;
pub mod project;
pub mod target;
pub mod thread;
pub mod video_target;

pub use audio_target::AudioTarget;
pub use project::Project;
pub use target::TargetKind;
pub use thread::{StackFrame, Thread, ThreadStatus};
pub use video_target::{VideoEffects, VideoTarget};
