//! Audio-sync controller.
//!
//! Keeps the beat clock phase-locked to the backing track. Beat 0 is placed at
//! `music_start + beat0_offset`; loop boundaries are derived from the clip's
//! sample count, never from the polled playback position, so boundary `n` is
//! exactly `music_start + n * sample_count / sample_rate`.
//!
//! Every deferred step (scheduled load, music start, input arming, tutorial
//! end) carries the load version current when it was queued and is dropped
//! silently once a newer load supersedes it.

use anyhow::Result;
use log::{debug, info, warn};

use cadenza_types::{
    ClipInfo, ConfigError, CueKind, CycleIndex, EventQueue, RhythmEvent, SongData, SyncConfig,
    TimeUs,
};

use crate::cues::CueScheduler;
use crate::transport::AudioTransport;

/// The rhythm side the controller drives: the beat clock plus the judge.
pub trait RhythmTarget {
    fn stop_rhythm(&mut self);

    /// Anchor beat 0 at `anchor_us` on the audio clock.
    fn start_rhythm_at(&mut self, anchor_us: TimeUs, now_us: TimeUs);

    /// Drop all per-cycle records.
    fn reset_rhythm_state(&mut self);

    fn set_input_enabled(&mut self, recording: bool, casting: bool);

    /// Adopt the song's tempo and timing pattern before it is scheduled.
    fn apply_song(&mut self, song: &SongData) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deferred {
    version: u64,
    fire_at_us: TimeUs,
}

#[derive(Debug, Clone)]
struct PendingLoad {
    at: Deferred,
    song: SongData,
    clip: ClipInfo,
    initial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Playback {
    music_start_us: TimeUs,
    rhythm_start_us: TimeUs,
    /// Loops completed since `music_start_us`.
    loop_index: u64,
    next_boundary_us: TimeUs,
}

pub struct AudioSyncController<T: AudioTransport> {
    transport: T,
    config: SyncConfig,
    beats_per_cycle: u32,
    cues: CueScheduler,
    version: u64,
    song: Option<SongData>,
    clip: Option<ClipInfo>,
    playback: Option<Playback>,
    pending_load: Option<PendingLoad>,
    pending_start: Option<Deferred>,
    pending_arm: Option<Deferred>,
    /// Arming on first play starts the tutorial.
    arm_starts_tutorial: bool,
    tutorial_end: Option<Deferred>,
}

impl<T: AudioTransport> AudioSyncController<T> {
    pub fn new(transport: T, config: SyncConfig, cues: CueScheduler, beats_per_cycle: u32) -> Self {
        Self {
            transport,
            config,
            beats_per_cycle,
            cues,
            version: 0,
            song: None,
            clip: None,
            playback: None,
            pending_load: None,
            pending_start: None,
            pending_arm: None,
            arm_starts_tutorial: false,
            tutorial_end: None,
        }
    }

    pub fn now_us(&self) -> TimeUs {
        self.transport.current_time_us()
    }

    /// Stop whatever is playing and load `song`. Music is scheduled after the
    /// intro delay (initial or mid-game).
    pub fn load<R: RhythmTarget + ?Sized>(
        &mut self,
        song: SongData,
        clip: ClipInfo,
        initial: bool,
        target: &mut R,
        events: &mut EventQueue,
    ) -> Result<()> {
        let now = self.now_us();
        self.version += 1;
        self.stop_current(target);
        self.pending_load = None;
        target.apply_song(&song)?;

        let intro = self.config.intro_delay_us(initial);
        info!(
            "Loading song '{}' (v{}): intro={}ms beat0Offset={:.3}s bpm={:.2}",
            song.title,
            self.version,
            intro / 1000,
            song.beat0_offset_secs,
            song.bpm
        );
        self.song = Some(song);
        self.clip = Some(clip);
        self.pending_start = Some(Deferred {
            version: self.version,
            fire_at_us: now + intro,
        });
        if intro == 0 {
            self.tick(target, events)?;
        }
        Ok(())
    }

    /// Queue a load after `delay_us`. A newer request, load or stop
    /// supersedes it; the current song keeps playing meanwhile.
    pub fn request_load(&mut self, song: SongData, clip: ClipInfo, delay_us: TimeUs, initial: bool) {
        if let Some(previous) = &self.pending_load {
            debug!("Song request '{}' superseded", previous.song.title);
        }
        debug!(
            "Song '{}' requested in {}ms (v{})",
            song.title,
            delay_us / 1000,
            self.version
        );
        self.pending_load = Some(PendingLoad {
            at: Deferred {
                version: self.version,
                fire_at_us: self.now_us() + delay_us,
            },
            song,
            clip,
            initial,
        });
    }

    /// Stop playback and rhythm. Pending steps are cancelled.
    pub fn stop<R: RhythmTarget + ?Sized>(&mut self, target: &mut R) {
        self.version += 1;
        self.pending_load = None;
        self.stop_current(target);
        self.song = None;
        self.clip = None;
    }

    fn stop_current<R: RhythmTarget + ?Sized>(&mut self, target: &mut R) {
        self.cues.stop_all_scheduled();
        self.transport.stop();
        target.stop_rhythm();
        target.set_input_enabled(false, false);
        target.reset_rhythm_state();
        self.playback = None;
        self.pending_start = None;
        self.pending_arm = None;
        self.tutorial_end = None;
        self.arm_starts_tutorial = false;
    }

    /// Run every deferred step that is due. Call once per host frame.
    pub fn tick<R: RhythmTarget + ?Sized>(
        &mut self,
        target: &mut R,
        events: &mut EventQueue,
    ) -> Result<()> {
        let now = self.now_us();

        if let Some(pending) = self.pending_load.take() {
            if pending.at.version != self.version {
                debug!("Dropping superseded song request '{}'", pending.song.title);
            } else if now >= pending.at.fire_at_us {
                return self.load(pending.song, pending.clip, pending.initial, target, events);
            } else {
                self.pending_load = Some(pending);
            }
        }

        if let Some(start) = self.take_due(|s| &mut s.pending_start, now) {
            self.begin_playback(start, target, events)?;
        }
        self.check_boundaries(now, target, events);
        if self.take_due(|s| &mut s.pending_arm, now).is_some() {
            self.arm(now, target, events);
        }
        if self.take_due(|s| &mut s.tutorial_end, now).is_some() {
            let cycle_index = self.song.as_ref().map_or(0, |s| s.tutorial_cycles) as CycleIndex;
            target.set_input_enabled(true, true);
            info!("Tutorial ended at cycle {cycle_index}; casting enabled");
            events.push(RhythmEvent::TutorialEnded { cycle_index });
        }
        self.cues.fire_due(now, events);
        Ok(())
    }

    /// Take a deferred step if it belongs to the current load and is due.
    fn take_due(
        &mut self,
        field: impl Fn(&mut Self) -> &mut Option<Deferred>,
        now: TimeUs,
    ) -> Option<Deferred> {
        let version = self.version;
        let slot = field(self);
        match *slot {
            Some(d) if d.version != version => {
                *slot = None;
                None
            }
            Some(d) if now >= d.fire_at_us => slot.take(),
            _ => None,
        }
    }

    fn begin_playback<R: RhythmTarget + ?Sized>(
        &mut self,
        start: Deferred,
        target: &mut R,
        events: &mut EventQueue,
    ) -> Result<()> {
        let (Some(song), Some(clip)) = (self.song.as_ref(), self.clip) else {
            return Ok(());
        };
        let now = self.now_us();
        let music_start_us = now + self.config.schedule_lead_us();
        self.transport.schedule_start(clip, music_start_us, song.looped)?;

        let rhythm_start_us = music_start_us + song.beat0_offset_us();
        target.set_input_enabled(false, false);
        target.start_rhythm_at(rhythm_start_us, now);
        self.playback = Some(Playback {
            music_start_us,
            rhythm_start_us,
            loop_index: 0,
            next_boundary_us: music_start_us + clip.loop_offset_us(1),
        });
        self.pending_arm = Some(Deferred {
            version: start.version,
            fire_at_us: rhythm_start_us - self.config.arm_lead_us(),
        });
        self.arm_starts_tutorial = true;

        info!(
            "Song '{}' scheduled: music at {}us, beat 0 at {}us",
            song.title, music_start_us, rhythm_start_us
        );
        events.push(RhythmEvent::SongLoaded {
            title: song.title.clone(),
            version: start.version,
            music_start_us,
            rhythm_start_us,
        });
        Ok(())
    }

    fn arm<R: RhythmTarget + ?Sized>(&mut self, now: TimeUs, target: &mut R, events: &mut EventQueue) {
        let tutorial_cycles = self.song.as_ref().map_or(0, |s| s.tutorial_cycles);
        let tutorial = self.arm_starts_tutorial && tutorial_cycles > 0;
        self.arm_starts_tutorial = false;

        target.reset_rhythm_state();
        target.set_input_enabled(true, !tutorial);
        debug!("Input armed (v{}) at {now}us", self.version);
        events.push(RhythmEvent::InputArmed {
            version: self.version,
            at_us: now,
        });

        if tutorial {
            self.start_tutorial(tutorial_cycles, now, events);
        }
    }

    fn start_tutorial(&mut self, tutorial_cycles: u32, now: TimeUs, events: &mut EventQueue) {
        let (Some(song), Some(playback)) = (self.song.as_ref(), self.playback) else {
            return;
        };
        let Ok(beat) = song.beat_duration() else {
            return;
        };
        let anchor = playback.rhythm_start_us;
        let slot_count = song.pattern.slot_count();
        let mut hit_times = Vec::with_capacity((tutorial_cycles * slot_count) as usize);
        for cycle in 0..tutorial_cycles {
            for slot in 0..slot_count {
                let beats = (cycle * self.beats_per_cycle + slot) as f64
                    + song.pattern.expected_offset(slot);
                hit_times.push(anchor + beat.beats_to_us(beats));
            }
        }
        let end_us = anchor + beat.beats_to_us((tutorial_cycles * self.beats_per_cycle) as f64);
        self.tutorial_end = Some(Deferred {
            version: self.version,
            fire_at_us: end_us,
        });
        info!("Tutorial: {tutorial_cycles} cycles, casting from {end_us}us");
        for at in hit_times {
            self.cues.schedule(CueKind::TutorialHit, at, now, events);
        }
    }

    fn check_boundaries<R: RhythmTarget + ?Sized>(
        &mut self,
        now: TimeUs,
        target: &mut R,
        events: &mut EventQueue,
    ) {
        let (Some(song), Some(clip), Some(mut playback)) =
            (self.song.as_ref(), self.clip, self.playback)
        else {
            return;
        };
        if now < playback.next_boundary_us - self.config.loop_epsilon_us() {
            return;
        }

        if !song.looped {
            let title = song.title.clone();
            info!("Song '{title}' ended at {now}us");
            self.stop_current(target);
            events.push(RhythmEvent::SongEnded { title, at_us: now });
            return;
        }

        let offset = song.beat0_offset_us();
        while now >= playback.next_boundary_us - self.config.loop_epsilon_us() {
            playback.loop_index += 1;
            let boundary_us = playback.music_start_us + clip.loop_offset_us(playback.loop_index);
            playback.rhythm_start_us = boundary_us + offset;
            playback.next_boundary_us =
                playback.music_start_us + clip.loop_offset_us(playback.loop_index + 1);
            debug!(
                "Loop {} boundary at {boundary_us}us, beat 0 at {}us",
                playback.loop_index, playback.rhythm_start_us
            );
            events.push(RhythmEvent::LoopResynced {
                loop_index: playback.loop_index,
                boundary_us,
                rhythm_start_us: playback.rhythm_start_us,
            });
        }

        self.cues.stop_all_scheduled();
        target.stop_rhythm();
        target.set_input_enabled(false, false);
        target.reset_rhythm_state();
        self.tutorial_end = None;
        self.arm_starts_tutorial = false;

        let mut rhythm_start_us = playback.rhythm_start_us;
        if rhythm_start_us < now - self.config.late_rearm_tolerance_us() {
            let clamped_us = now + self.config.rearm_epsilon_us();
            warn!(
                "Loop re-arm {}us late; beat 0 moved from {rhythm_start_us}us to {clamped_us}us",
                now - rhythm_start_us
            );
            events.push(RhythmEvent::LateRearm {
                scheduled_us: rhythm_start_us,
                clamped_us,
            });
            rhythm_start_us = clamped_us;
        }
        playback.rhythm_start_us = rhythm_start_us;
        target.start_rhythm_at(rhythm_start_us, now);
        self.pending_arm = Some(Deferred {
            version: self.version,
            fire_at_us: rhythm_start_us - self.config.arm_lead_us(),
        });
        self.playback = Some(playback);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current_song(&self) -> Option<&SongData> {
        self.song.as_ref()
    }

    pub fn clip(&self) -> Option<ClipInfo> {
        self.clip
    }

    pub fn music_start_us(&self) -> Option<TimeUs> {
        self.playback.map(|p| p.music_start_us)
    }

    /// Beat-0 time of the current play segment.
    pub fn rhythm_start_us(&self) -> Option<TimeUs> {
        self.playback.map(|p| p.rhythm_start_us)
    }

    pub fn loop_index(&self) -> Option<u64> {
        self.playback.map(|p| p.loop_index)
    }

    pub fn next_boundary_us(&self) -> Option<TimeUs> {
        self.playback.map(|p| p.next_boundary_us)
    }

    /// A load is queued, waiting on its intro, or playing.
    pub fn is_active(&self) -> bool {
        self.playback.is_some() || self.pending_start.is_some() || self.pending_load.is_some()
    }

    pub fn is_input_armed_pending(&self) -> bool {
        self.pending_arm.is_some()
    }

    pub fn cues(&self) -> &CueScheduler {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut CueScheduler {
        &mut self.cues
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
