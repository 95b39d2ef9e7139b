//! Audio cue scheduling.
//!
//! One-shot cues (bar, beat, hit, cast) fire as soon as the triggering event
//! is seen. Scheduled cues (tutorial hits) wait in a fixed-size pool; when the
//! pool is full the oldest entry is overwritten.

use log::debug;

use cadenza_types::{AudioCue, CueConfig, CueKind, EventQueue, RhythmEvent, TimeUs};

#[derive(Debug, Clone)]
pub struct CueScheduler {
    pool: Vec<Option<AudioCue>>,
    next: usize,
    immediate_threshold_us: TimeUs,
}

impl CueScheduler {
    pub fn new(config: &CueConfig) -> Self {
        Self {
            pool: vec![None; config.pool_size.max(1)],
            next: 0,
            immediate_threshold_us: config.immediate_threshold_us(),
        }
    }

    /// One-shot cue triggered by an engine event, if any.
    pub fn cue_for(event: &RhythmEvent, now_us: TimeUs) -> Option<AudioCue> {
        match event {
            RhythmEvent::Beat(beat) => Some(AudioCue {
                kind: if beat.beat_in_cycle == 0 {
                    CueKind::Bar
                } else {
                    CueKind::Beat
                },
                at_us: beat.beat_start_us,
            }),
            RhythmEvent::HitRecorded(_) => Some(AudioCue {
                kind: CueKind::Hit,
                at_us: now_us,
            }),
            RhythmEvent::ComboReady(_) => Some(AudioCue {
                kind: CueKind::Cast,
                at_us: now_us,
            }),
            _ => None,
        }
    }

    /// Schedule a cue at `at_us`. Cues already due fire immediately.
    pub fn schedule(&mut self, kind: CueKind, at_us: TimeUs, now_us: TimeUs, events: &mut EventQueue) {
        if at_us <= now_us + self.immediate_threshold_us {
            events.push(RhythmEvent::Cue(AudioCue {
                kind,
                at_us: now_us,
            }));
            return;
        }
        if let Some(dropped) = self.pool[self.next].replace(AudioCue { kind, at_us }) {
            debug!("Cue pool full, dropping {:?} at {}us", dropped.kind, dropped.at_us);
        }
        self.next = (self.next + 1) % self.pool.len();
    }

    /// Emit every scheduled cue due by `now_us`, earliest first.
    pub fn fire_due(&mut self, now_us: TimeUs, events: &mut EventQueue) {
        let mut due: Vec<AudioCue> = self
            .pool
            .iter_mut()
            .filter(|slot| slot.is_some_and(|c| c.at_us <= now_us))
            .filter_map(Option::take)
            .collect();
        due.sort_by_key(|c| c.at_us);
        events.extend(due.into_iter().map(RhythmEvent::Cue));
    }

    pub fn stop_all_scheduled(&mut self) {
        self.pool.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn pending(&self) -> usize {
        self.pool.iter().filter(|slot| slot.is_some()).count()
    }
}
