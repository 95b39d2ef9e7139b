use anyhow::{Result, bail};
use log::{debug, info};

use cadenza_audio::{AudioSyncController, AudioTransport, CueScheduler, RhythmTarget, probe_wav};
use cadenza_input::InputSource;
use cadenza_play::{JudgeStats, RhythmJudge};
use cadenza_timing::{BeatClock, ClockDomain, TimeProvider};
use cadenza_types::{
    ClipInfo, ComboRecord, ConfigError, EngineConfig, EventQueue, RhythmEvent, SongData,
    SongLibrary, TimeUs, TimingPattern,
};

/// Tempo used until a song or `set_tempo` says otherwise.
const DEFAULT_BPM: f64 = 120.0;

/// Clip length for `song`: inline metadata first, then the WAV header.
pub fn clip_for(song: &SongData) -> Result<ClipInfo> {
    if let Some(clip) = song.clip_info {
        return Ok(clip);
    }
    match &song.clip {
        Some(path) => probe_wav(path),
        None => bail!("Song '{}' has neither a clip file nor clip info", song.title),
    }
}

/// Clock and judge, driven by the sync controller during song playback.
struct Rig {
    clock: BeatClock,
    judge: RhythmJudge,
}

impl RhythmTarget for Rig {
    fn stop_rhythm(&mut self) {
        self.clock.stop();
    }

    fn start_rhythm_at(&mut self, anchor_us: TimeUs, now_us: TimeUs) {
        self.clock.start_at(ClockDomain::Audio, anchor_us, now_us);
    }

    fn reset_rhythm_state(&mut self) {
        self.judge.reset_all_state();
    }

    fn set_input_enabled(&mut self, recording: bool, casting: bool) {
        self.judge.set_input_enabled(recording, casting);
    }

    fn apply_song(&mut self, song: &SongData) -> Result<(), ConfigError> {
        song.validate()?;
        song.pattern.validate_for(&self.judge.resolver().layout())?;
        self.clock.set_tempo(song.bpm)?;
        self.judge.set_pattern(song.pattern.clone())
    }
}

pub struct RhythmSession<T: AudioTransport> {
    config: EngineConfig,
    rig: Rig,
    sync: AudioSyncController<T>,
    wall: Box<dyn TimeProvider>,
    events: EventQueue,
}

impl<T: AudioTransport> RhythmSession<T> {
    pub fn new(
        config: EngineConfig,
        transport: T,
        wall: Box<dyn TimeProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = config.rhythm.layout();
        let clock = BeatClock::new(DEFAULT_BPM, layout.beats_per_cycle)?;
        let pattern = TimingPattern::new("Default", vec![0.0; layout.slot_count as usize]);
        let judge = RhythmJudge::new(&config, pattern, &clock)?;
        let sync = AudioSyncController::new(
            transport,
            config.sync.clone(),
            CueScheduler::new(&config.cues),
            layout.beats_per_cycle,
        );
        Ok(Self {
            config,
            rig: Rig { clock, judge },
            sync,
            wall,
            events: EventQueue::new(),
        })
    }

    fn domain_now_us(&self, domain: ClockDomain) -> TimeUs {
        match domain {
            ClockDomain::Wall => self.wall.now_us(),
            ClockDomain::Audio => self.sync.now_us(),
        }
    }

    /// Current time in the clock's active domain.
    pub fn now_us(&self) -> TimeUs {
        self.domain_now_us(self.rig.clock.domain())
    }

    /// Anchor beat 0 at `anchor_us` in `domain` and run the clock.
    pub fn start(&mut self, domain: ClockDomain, anchor_us: TimeUs) {
        let now = self.domain_now_us(domain);
        self.rig.clock.start_at(domain, anchor_us, now);
    }

    /// Stop the clock. Per-cycle records are kept.
    pub fn stop(&mut self) {
        self.rig.clock.stop();
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ConfigError> {
        self.rig.clock.set_tempo(bpm)
    }

    pub fn set_pattern(&mut self, pattern: TimingPattern) -> Result<(), ConfigError> {
        self.rig.judge.set_pattern(pattern)
    }

    /// Clear every record and disable input until `enable_input`.
    pub fn reset_all_state(&mut self) {
        self.rig.judge.reset_all_state();
    }

    pub fn enable_input(&mut self) {
        self.rig.judge.enable_input();
    }

    /// Stop the current song and load `song`. `initial` selects the longer
    /// start-up intro delay.
    pub fn load_song(&mut self, song: SongData, initial: bool) -> Result<()> {
        let clip = clip_for(&song)?;
        self.sync
            .load(song, clip, initial, &mut self.rig, &mut self.events)
    }

    pub fn load_song_by_title(
        &mut self,
        library: &SongLibrary,
        title: &str,
        initial: bool,
    ) -> Result<()> {
        let song = library.find(title)?.clone();
        self.load_song(song, initial)
    }

    /// Load the library's default song as the initial song, if there is one.
    pub fn load_default_song(&mut self, library: &SongLibrary) -> Result<bool> {
        let Some(song) = library.default_song() else {
            info!("Song library is empty; nothing to auto-load");
            return Ok(false);
        };
        self.load_song(song.clone(), true)?;
        Ok(true)
    }

    /// Switch to `song` after `delay_us`, superseding earlier requests.
    pub fn request_song(&mut self, song: SongData, delay_us: TimeUs) -> Result<()> {
        let clip = clip_for(&song)?;
        self.sync.request_load(song, clip, delay_us, false);
        Ok(())
    }

    pub fn stop_song(&mut self) {
        self.sync.stop(&mut self.rig);
    }

    /// Advance the engine to "now": run due sync steps, report crossed beats
    /// and judge polled presses in timestamp order (beats first on ties).
    pub fn tick(&mut self, input: &mut dyn InputSource) -> Result<()> {
        self.sync.tick(&mut self.rig, &mut self.events)?;

        let now = self.now_us();
        let first_new = self.events.len();
        let mut beats = self.rig.clock.tick(now).into_iter().peekable();
        let mut presses = input.poll(now).into_iter().peekable();
        loop {
            let beat_first = match (beats.peek(), presses.peek()) {
                (Some(beat), Some(press)) => beat.beat_start_us <= press.time_us,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if beat_first {
                if let Some(beat) = beats.next() {
                    self.events.push(RhythmEvent::Beat(beat));
                    self.rig.judge.on_beat(&beat, &mut self.events);
                }
            } else if let Some(press) = presses.next() {
                self.rig.judge.on_press(
                    &press.input_id,
                    press.time_us,
                    &self.rig.clock,
                    &mut self.events,
                );
            }
        }

        let cues: Vec<RhythmEvent> = self
            .events
            .iter()
            .skip(first_new)
            .filter_map(|event| CueScheduler::cue_for(event, now))
            .map(RhythmEvent::Cue)
            .collect();
        if !cues.is_empty() {
            debug!("{} cues at {now}us", cues.len());
        }
        self.events.extend(cues);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<RhythmEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &BeatClock {
        &self.rig.clock
    }

    pub fn judge(&self) -> &RhythmJudge {
        &self.rig.judge
    }

    pub fn stats(&self) -> &JudgeStats {
        self.rig.judge.stats()
    }

    pub fn last_combo(&self) -> Option<&ComboRecord> {
        self.rig.judge.last_combo()
    }

    pub fn sync(&self) -> &AudioSyncController<T> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut AudioSyncController<T> {
        &mut self.sync
    }
}
