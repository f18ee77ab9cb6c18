use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    time::Duration,
};

use beatlane_core::{
    BeatTrack, Clock, EndReason, FinalResult, GameSession, Grade, InputEvent, NoteGenerator,
    PlaybackClock, RenderGraph, Renderer, SessionConfig, WallClock,
};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Playback keeps running this long after the last note ends.
const TRACK_TAIL_SECONDS: f64 = 1.0;

fn main() -> beatlane_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { session, output } => run_generate(&session, output.as_ref()),
        Commands::Play {
            session,
            inputs,
            autoplay,
            realtime,
            stop_at,
        } => run_play(&session, inputs.as_ref(), autoplay, realtime, stop_at),
    }
}

fn run_generate(args: &SessionArgs, output: Option<&PathBuf>) -> beatlane_core::Result<()> {
    let config = args.resolve()?;
    let difficulty = config.validate()?;
    let beats = BeatTrack::load(&args.beats)?;
    let mut rng = seeded_rng(config.seed);

    let notes = NoteGenerator::default().generate(&beats.beats, difficulty, &mut rng);
    tracing::info!(beats = beats.beats.len(), notes = notes.len(), %difficulty, "chart generated");

    let json = serde_json::to_string_pretty(&notes)?;
    match output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn run_play(
    args: &SessionArgs,
    inputs: Option<&PathBuf>,
    autoplay: bool,
    realtime: bool,
    stop_at: Option<f64>,
) -> beatlane_core::Result<()> {
    let mut config = args.resolve()?;
    let beats = BeatTrack::load(&args.beats)?;
    if config.audio_source.is_empty() {
        if let Some(source) = &beats.source {
            config.audio_source = source.clone();
        }
    }
    if let Some(bpm) = beats.tempo_bpm() {
        tracing::info!(bpm, beats = beats.beats.len(), "beat track loaded");
    }

    let mut rng = seeded_rng(config.seed);
    let mut session = GameSession::from_beats(&config, &beats, &mut rng)?;
    let mut script = match inputs {
        Some(path) => load_script(path)?,
        None => VecDeque::new(),
    };

    let frame = config.frame_seconds();
    let track_end = session.track_end() + TRACK_TAIL_SECONDS;
    let mut playback = PlaybackClock::new();
    let wall = WallClock::start();
    let mut renderer = RenderGraph::new();
    let mut releases: Vec<usize> = Vec::new();

    let reason = loop {
        let now = playback.now_seconds();
        if stop_at.is_some_and(|limit| now >= limit) {
            break EndReason::Quit;
        }
        if now >= track_end {
            break EndReason::EndOfTrack;
        }

        for lane in releases.drain(..) {
            session.on_key_up(lane);
        }
        let presses = if autoplay {
            autoplay_presses(&session, now, frame)
        } else {
            scripted_presses(&mut script, now)
        };
        for event in presses {
            session.on_key_down(event.track, event.timestamp);
            releases.push(event.track);
        }

        let wall_now = if realtime { wall.now_seconds() } else { now };
        let report = session.tick(now, wall_now);
        if report.expired > 0 {
            tracing::debug!(expired = report.expired, time = now, "notes scrolled off");
        }
        renderer.draw(&session.snapshot())?;

        if realtime {
            std::thread::sleep(Duration::from_secs_f64(frame));
        }
        playback.advance(frame);
    };

    let result = session.end(reason);
    tracing::info!(frames = renderer.frames_drawn(), "playback finished");
    print_result(&result);
    Ok(())
}

/// Presses every unresolved note whose time fell inside the last frame, stamped
/// with the note's exact time.
fn autoplay_presses(session: &GameSession, now: f64, frame: f64) -> Vec<InputEvent> {
    session
        .notes()
        .unresolved()
        .filter(|(_, note)| !note.hold && note.time > now - frame && note.time <= now)
        .map(|(_, note)| InputEvent::new(note.time, note.track))
        .collect()
}

fn scripted_presses(script: &mut VecDeque<InputEvent>, now: f64) -> Vec<InputEvent> {
    let mut presses = Vec::new();
    while script.front().is_some_and(|event| event.timestamp <= now) {
        presses.extend(script.pop_front());
    }
    presses
}

fn load_script(path: &Path) -> beatlane_core::Result<VecDeque<InputEvent>> {
    let raw = std::fs::read_to_string(path)?;
    let mut events: Vec<InputEvent> = serde_json::from_str(&raw)?;
    events.retain(|event| {
        let keep = event.timestamp.is_finite();
        if !keep {
            tracing::warn!(track = event.track, "dropping scripted press without a valid timestamp");
        }
        keep
    });
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(events.into())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_result(result: &FinalResult) {
    println!("Game Over ({:?})", result.reason);
    println!("Final Score: {}", result.score);
    println!("Max Combo: {}", result.max_combo);
    for grade in Grade::ALL {
        println!("  {:<8} {}", grade.label(), result.tally.count(grade));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-driven rhythm game engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a note chart from a beat track and print it as JSON.
    Generate {
        #[command(flatten)]
        session: SessionArgs,
        /// Write the chart to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Play a headless session against scripted or automatic key presses.
    Play {
        #[command(flatten)]
        session: SessionArgs,
        /// JSON list of `{ "timestamp": seconds, "track": lane }` key presses.
        #[arg(short, long, conflicts_with = "autoplay")]
        inputs: Option<PathBuf>,
        /// Press every tap and hold onset exactly on time.
        #[arg(long)]
        autoplay: bool,
        /// Pace ticks at the configured frame rate instead of running flat out.
        #[arg(long)]
        realtime: bool,
        /// Quit once playback reaches this many seconds.
        #[arg(long)]
        stop_at: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Beat track JSON produced by the audio analysis.
    #[arg(short, long)]
    beats: PathBuf,
    /// Session configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Difficulty tier: Easy, Normal or Hard.
    #[arg(short, long)]
    difficulty: Option<String>,
    /// Seed for note generation.
    #[arg(short, long)]
    seed: Option<u64>,
}

impl SessionArgs {
    /// Loads the config file, if any, and applies command line overrides.
    fn resolve(&self) -> beatlane_core::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(difficulty) = &self.difficulty {
            config.difficulty = difficulty.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}
