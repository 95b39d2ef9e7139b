// cadenza: command-line driver for the rhythm engine.
//
// Runs simulations (stepped or paced by the system clock) from JSON documents and inspects clips and
// configuration files.

mod simulate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use cadenza_audio::probe_wav;
use cadenza_input::InputLogger;
use cadenza_types::{EngineConfig, SongData, SongLibrary, secs_to_us};

use simulate::{Pacing, Simulation, describe};

#[derive(Parser, Debug)]
#[command(name = "cadenza", about = "Beat clock and input judgment engine")]
struct Args {
    /// Log at debug level (RUST_LOG still takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an input script against a song and print the event log.
    Simulate {
        /// Engine config JSON. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Song JSON to play.
        #[arg(long, conflicts_with = "library")]
        song: Option<PathBuf>,

        /// Song library JSON; plays `--title` or the library's default song.
        #[arg(long)]
        library: Option<PathBuf>,

        #[arg(long, requires = "library")]
        title: Option<String>,

        /// Input script: a JSON array of `{inputId, timeUs}`.
        #[arg(long)]
        inputs: Option<PathBuf>,

        /// Write the consumed inputs back out as an input log.
        #[arg(long)]
        record: Option<PathBuf>,

        /// Simulated time in seconds.
        #[arg(long, default_value = "30")]
        duration: f64,

        /// Frame interval in milliseconds.
        #[arg(long, default_value = "16.667")]
        frame_ms: f64,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,

        /// Pace frames by the system clock instead of stepping time.
        #[arg(long)]
        realtime: bool,
    },

    /// Print the length of a WAV clip.
    ClipInfo { wav: PathBuf },

    /// Validate a configuration document.
    CheckConfig {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "engine")]
        kind: DocumentKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocumentKind {
    Engine,
    Song,
    Library,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Simulate {
            config,
            song,
            library,
            title,
            inputs,
            record,
            duration,
            frame_ms,
            json,
            realtime,
        } => {
            let config = load_config(config.as_deref())?;
            let song = match (song, library) {
                (Some(path), _) => Some(SongData::read(&path)?),
                (None, Some(path)) => pick_song(&path, title.as_deref())?,
                (None, None) => None,
            };
            let inputs = match inputs {
                Some(path) => InputLogger::read(&path)?,
                None => Vec::new(),
            };
            let sim = Simulation {
                config,
                song,
                inputs,
                duration_us: secs_to_us(duration.max(0.0)),
                frame_us: (frame_ms * 1000.0).round() as i64,
                pacing: if realtime {
                    Pacing::Realtime
                } else {
                    Pacing::Stepped
                },
            };
            let report = sim.run(|event| {
                if json {
                    println!("{}", serde_json::to_string(event)?);
                } else {
                    println!("{}", describe(event));
                }
                Ok(())
            })?;

            if json {
                println!("{}", serde_json::to_string(&report.stats)?);
            } else {
                let s = &report.stats;
                let mean = s
                    .mean_signed_error_us()
                    .map_or_else(|| "-".to_string(), |us| format!("{:+.1}ms", us / 1000.0));
                println!(
                    "stats   matched={} early={} late={} unmatched={} rejected={} cast={} meanError={mean}",
                    s.matched,
                    s.early_count,
                    s.late_count,
                    s.unmatched,
                    s.rejected(),
                    s.combos_cast,
                );
            }
            if let Some(path) = record {
                report.inputs.write(&path)?;
                info!("Wrote {} inputs to {}", report.inputs.len(), path.display());
            }
        }
        Command::ClipInfo { wav } => {
            let clip = probe_wav(&wav)?;
            println!("{}", wav.display());
            println!("  sample rate: {} Hz", clip.sample_rate);
            println!("  frames:      {}", clip.sample_count);
            println!(
                "  duration:    {:.6}s ({}us)",
                clip.duration_secs(),
                clip.duration_us()
            );
        }
        Command::CheckConfig { file, kind } => {
            match kind {
                DocumentKind::Engine => {
                    let config = EngineConfig::read(&file)?;
                    let layout = config.rhythm.layout();
                    println!(
                        "OK: {} beats per cycle, {} slots, cast on beat {}, {} bindings",
                        layout.beats_per_cycle,
                        layout.slot_count,
                        layout.cast_beat(),
                        config.bindings.len()
                    );
                }
                DocumentKind::Song => {
                    let song = SongData::read(&file)?;
                    println!(
                        "OK: '{}' at {:.2} bpm, pattern '{}'",
                        song.title, song.bpm, song.pattern.name
                    );
                }
                DocumentKind::Library => {
                    let library = SongLibrary::read(&file)?;
                    let default = library.default_song().map_or("-", |s| s.title.as_str());
                    println!("OK: {} songs, default '{default}'", library.songs.len());
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::read(path)
        .with_context(|| format!("Failed to load engine config {}", path.display()))?;
    info!("Loaded engine config {}", path.display());
    Ok(config)
}

fn pick_song(library: &Path, title: Option<&str>) -> Result<Option<SongData>> {
    let library = SongLibrary::read(library)?;
    if let Some(title) = title {
        return Ok(Some(library.find(title)?.clone()));
    }
    let song = library.default_song().cloned();
    if song.is_none() {
        warn!("Song library is empty; simulating without a song");
    }
    Ok(song)
}
