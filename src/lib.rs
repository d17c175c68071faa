//! STEINA - execution core for a block-based video/audio runtime
//!
//! Re-exports all modules for use by host embeddings and binary targets.

// Core engine (sequencer, play queues, runtime, events)
pub mod core;

// Entities (targets, threads, project)
pub mod entities;

// Block primitives (video, audio, motion, metadata)
pub mod blocks;

// Re-export commonly used types from core
pub use core::events::{
    downcast_event, AudioPlayFinishedEvent, BoxedEvent, EventBus, ProjectStopAllEvent,
    VideoPlayFinishedEvent,
};
pub use core::play_queue::{AudioPlay, AudioState, PlayDirection, VideoPlay, VideoState};
pub use core::runtime::{MotionState, Profiler, Runtime};
pub use core::sequencer::{BlockExecutor, Sequencer};

// Re-export entities
pub use entities::{AudioTarget, Project, TargetKind, Thread, ThreadStatus, VideoTarget};

// Re-export the block-primitive context
pub use blocks::BlockUtil;
