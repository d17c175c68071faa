//! Core engine modules - sequencer, play queues, runtime, events, timing
//!
//! These modules form the execution engine, independent of any host UI.

pub mod events;
pub mod play_queue;
pub mod runtime;
pub mod sequencer;
pub mod timer;

// Re-exports for convenience
pub use events::{downcast_event, BoxedEvent, EventBus};
pub use play_queue::{AudioPlay, AudioState, PlayDirection, VideoPlay, VideoState};
pub use runtime::{MotionState, Profiler, Runtime};
pub use sequencer::{BlockExecutor, Sequencer};
pub use timer::Timer;
