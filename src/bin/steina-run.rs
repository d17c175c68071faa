//! Headless runner for development and testing.
//!
//! Loads a project (or builds a small demo one), starts a blocking play on
//! every target, then drives the sequencer for a fixed number of ticks and
//! prints what the play queues did.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use uuid::Uuid;

use steina::blocks::{audio, video, BlockUtil};
use steina::entities::{AudioTarget, Project, Thread, VideoTarget};
use steina::{BlockExecutor, Runtime, Sequencer};

/// Headless Steina core runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project JSON to load (a demo project is built when omitted)
    #[arg(value_name = "PROJECT")]
    project: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short = 't', long = "ticks", default_value = "300")]
    ticks: u64,

    /// Step time per tick in milliseconds
    #[arg(long = "step", default_value = "33.333")]
    step_ms: f64,

    /// Enable turbo mode (ignore redraw requests while stepping)
    #[arg(long = "turbo")]
    turbo: bool,
}

/// Minimal block program: every thread is a single blocking play block.
struct DemoExecutor {
    ops: HashMap<Uuid, DemoOp>,
}

enum DemoOp {
    PlayVideo,
    PlaySound,
}

impl BlockExecutor for DemoExecutor {
    fn execute(&mut self, runtime: &mut Runtime, thread: &mut Thread) {
        let Some(block) = thread.peek_stack() else {
            return;
        };
        let mut util = BlockUtil::new(runtime, thread);
        match self.ops.get(&block) {
            Some(DemoOp::PlayVideo) => video::play_entire_until_done(&mut util),
            Some(DemoOp::PlaySound) => audio::play_sound(&mut util),
            None => {}
        }
    }

    fn next_block(&self, _block: Uuid) -> Option<Uuid> {
        None
    }
}

fn demo_project() -> Project {
    let mut project = Project::new();
    project.targets.push(VideoTarget::new(30.0, 300).into());
    project
        .targets
        .push(AudioTarget::new(48_000, 48_000.0).into());
    project
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let project = match &args.project {
        Some(path) => Project::load(path)?,
        None => demo_project(),
    };
    let target_count = project.targets.len();
    let mut runtime = project.into_runtime(args.step_ms)?;
    runtime.turbo_mode = args.turbo;

    // One thread per target, each running a single blocking play block.
    let mut ops = HashMap::new();
    let targets: Vec<_> = runtime.targets.iter().map(|t| (t.id(), t.is_video())).collect();
    for (target_id, is_video) in targets {
        let block = Uuid::new_v4();
        ops.insert(
            block,
            if is_video {
                DemoOp::PlayVideo
            } else {
                DemoOp::PlaySound
            },
        );
        runtime.push_thread(block, target_id);
    }
    let mut executor = DemoExecutor { ops };

    info!(
        "running {} ticks over {} targets at {:.2}ms per tick",
        args.ticks, target_count, args.step_ms
    );

    let mut sequencer = Sequencer::new();
    let mut finished_threads = 0usize;
    for tick in 0..args.ticks {
        finished_threads += sequencer.step_threads(&mut runtime, &mut executor).len();
        runtime.clear_redraw();

        if tick % 30 == 0 {
            for target in &runtime.targets {
                if let Some(video) = target.as_video() {
                    info!(
                        "tick {:4}: video {} at frame {:.2}",
                        tick, video.id, video.current_frame
                    );
                }
            }
        }
        if runtime.threads.is_empty()
            && runtime.video_state.playing.is_empty()
            && runtime.audio_state.playing.is_empty()
        {
            info!("all threads and plays drained at tick {}", tick);
            break;
        }
    }

    println!(
        "done: {} threads finished, {} video plays and {} audio plays still queued",
        finished_threads,
        runtime.video_state.playing.len(),
        runtime.audio_state.playing.len()
    );
    for event in runtime.events.poll() {
        log::debug!("event: {}", (*event).type_name());
    }
    Ok(())
}
