//! Scripted run of a session.
//!
//! With [`Pacing::Stepped`] wall and audio time are both stepped by a fixed
//! frame interval, so the same config, song and input script always produce
//! the same event log. [`Pacing::Realtime`] reads the system clock instead and
//! sleeps between frames.

use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use log::info;

use cadenza_audio::ManualTransport;
use cadenza_input::{InputLogger, RawInput, RecordingSource, ScriptedInput};
use cadenza_play::JudgeStats;
use cadenza_session::RhythmSession;
use cadenza_timing::{ClockDomain, MockTimeProvider, SystemTimeProvider, TimeProvider};
use cadenza_types::{EngineConfig, RhythmEvent, SongData, TimeUs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Time advances by exactly one frame per tick.
    #[default]
    Stepped,
    /// Time is read from the system clock; the loop sleeps to the next frame.
    Realtime,
}

pub struct Simulation {
    pub config: EngineConfig,
    /// Played through the sync controller. Without a song the clock runs on
    /// wall time anchored at 0.
    pub song: Option<SongData>,
    pub inputs: Vec<RawInput>,
    pub duration_us: TimeUs,
    pub frame_us: TimeUs,
    pub pacing: Pacing,
}

pub struct SimulationReport {
    pub stats: JudgeStats,
    /// Every press the session consumed, in poll order.
    pub inputs: InputLogger,
}

impl Simulation {
    pub fn run(self, mut sink: impl FnMut(&RhythmEvent) -> Result<()>) -> Result<SimulationReport> {
        let stepped = match self.pacing {
            Pacing::Stepped => Some(Rc::new(MockTimeProvider::new())),
            Pacing::Realtime => None,
        };
        let time: Rc<dyn TimeProvider> = match &stepped {
            Some(mock) => Rc::clone(mock) as Rc<dyn TimeProvider>,
            None => Rc::new(SystemTimeProvider::new()),
        };
        let mut session =
            RhythmSession::new(self.config, ManualTransport::new(), Box::new(Rc::clone(&time)))?;

        match self.song {
            Some(song) => {
                info!("Simulating song '{}'", song.title);
                session.load_song(song, true)?;
            }
            None => {
                info!("Simulating without a song, wall clock anchored at 0");
                session.start(ClockDomain::Wall, 0);
            }
        }

        let frame_us = self.frame_us.max(1);
        let mut input = RecordingSource::new(ScriptedInput::new(self.inputs));
        let mut t = 0;
        loop {
            let now = match &stepped {
                Some(mock) => {
                    let now = t.min(self.duration_us);
                    mock.set_time(now);
                    now
                }
                None => time.now_us(),
            };
            session.sync().transport().set_time(now);
            session.tick(&mut input)?;
            for event in session.drain_events() {
                sink(&event)?;
            }
            if now >= self.duration_us {
                break;
            }
            t += frame_us;
            if stepped.is_none() {
                let wait = (t - time.now_us()).max(0);
                std::thread::sleep(Duration::from_micros(wait as u64));
            }
        }

        let (_, inputs) = input.into_parts();
        Ok(SimulationReport {
            stats: session.stats().clone(),
            inputs,
        })
    }
}

/// One-line text rendering of an event.
pub fn describe(event: &RhythmEvent) -> String {
    match event {
        RhythmEvent::Beat(b) => format!(
            "beat    {:>6} cycle {} beat {} @ {}us",
            b.abs_beat_index, b.cycle_index, b.beat_in_cycle, b.beat_start_us
        ),
        RhythmEvent::HitRecorded(h) => format!(
            "hit     cycle {} slot {} '{}' {:+.1}ms",
            h.cycle,
            h.slot,
            h.glyph,
            h.signed_error_ms()
        ),
        RhythmEvent::ComboReady(c) => format!(
            "combo   cycle {} [{}] {}",
            c.cycle_index,
            c.pattern_name,
            c.word_string()
        ),
        RhythmEvent::InputRejected {
            input_id,
            time_us,
            reason,
        } => format!("reject  '{input_id}' @ {time_us}us: {reason:?}"),
        RhythmEvent::SongLoaded {
            title,
            version,
            music_start_us,
            rhythm_start_us,
        } => format!(
            "song    '{title}' v{version} music @ {music_start_us}us beat 0 @ {rhythm_start_us}us"
        ),
        RhythmEvent::InputArmed { version, at_us } => {
            format!("armed   v{version} @ {at_us}us")
        }
        RhythmEvent::LoopResynced {
            loop_index,
            boundary_us,
            rhythm_start_us,
        } => format!("loop    {loop_index} boundary @ {boundary_us}us beat 0 @ {rhythm_start_us}us"),
        RhythmEvent::LateRearm {
            scheduled_us,
            clamped_us,
        } => format!("late    beat 0 {scheduled_us}us -> {clamped_us}us"),
        RhythmEvent::TutorialEnded { cycle_index } => {
            format!("tutorial ended, casting from cycle {cycle_index}")
        }
        RhythmEvent::SongEnded { title, at_us } => format!("end     '{title}' @ {at_us}us"),
        RhythmEvent::Cue(cue) => format!("cue     {:?} @ {}us", cue.kind, cue.at_us),
    }
}

#[cfg(test)]
mod tests {
    use cadenza_types::ClipInfo;

    use super::*;

    fn collect(sim: Simulation) -> (Vec<RhythmEvent>, SimulationReport) {
        let mut events = Vec::new();
        let report = sim
            .run(|e| {
                events.push(e.clone());
                Ok(())
            })
            .unwrap();
        (events, report)
    }

    #[test]
    fn wall_simulation_judges_script() {
        let sim = Simulation {
            config: EngineConfig::default(),
            song: None,
            inputs: vec![RawInput::new("KeyJ", 550_000), RawInput::new("Space", 700_000)],
            duration_us: 2_000_000,
            frame_us: 16_667,
            pacing: Pacing::Stepped,
        };
        let (events, report) = collect(sim);
        assert_eq!(report.stats.matched, 1);
        assert_eq!(report.stats.unbound, 1);
        assert_eq!(report.stats.combos_cast, 1);
        assert_eq!(report.inputs.len(), 2);
        let combo = events.iter().find_map(|e| match e {
            RhythmEvent::ComboReady(c) => Some(c.word_string()),
            _ => None,
        });
        assert_eq!(combo.as_deref(), Some("_A_"));
    }

    #[test]
    fn song_simulation_loads_and_loops() {
        let mut config = EngineConfig::default();
        config.sync.initial_intro_delay_secs = 0.0;
        let song = SongData {
            title: "Short".to_string(),
            clip_info: Some(ClipInfo::new(88_200, 44_100).unwrap()),
            ..Default::default()
        };
        let sim = Simulation {
            config,
            song: Some(song),
            inputs: Vec::new(),
            duration_us: 5_000_000,
            frame_us: 10_000,
            pacing: Pacing::Stepped,
        };
        let (events, _) = collect(sim);
        assert!(matches!(events[0], RhythmEvent::SongLoaded { .. }));
        let loops = events
            .iter()
            .filter(|e| matches!(e, RhythmEvent::LoopResynced { .. }))
            .count();
        assert_eq!(loops, 2);
    }

    #[test]
    fn realtime_run_follows_system_clock() {
        let sim = Simulation {
            config: EngineConfig::default(),
            song: None,
            inputs: Vec::new(),
            duration_us: 40_000,
            frame_us: 5_000,
            pacing: Pacing::Realtime,
        };
        let started = std::time::Instant::now();
        let (events, report) = collect(sim);
        assert!(started.elapsed() >= Duration::from_micros(40_000));
        let first_beat = events.iter().find_map(|e| match e {
            RhythmEvent::Beat(b) => Some(b.abs_beat_index),
            _ => None,
        });
        assert_eq!(first_beat, Some(0));
        assert_eq!(report.stats.matched, 0);
    }

    #[test]
    fn describe_is_single_line() {
        let event = RhythmEvent::InputRejected {
            input_id: "KeyJ".to_string(),
            time_us: 42,
            reason: cadenza_types::RejectReason::NoWindow,
        };
        let text = describe(&event);
        assert_eq!(text, "reject  'KeyJ' @ 42us: NoWindow");
    }
}
