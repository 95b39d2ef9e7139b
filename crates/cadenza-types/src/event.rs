//! Outbound events.
//!
//! The engine pushes every observable effect of a tick into an
//! [`EventQueue`]. Renderers, gameplay and audio collaborators drain the queue
//! after each tick; nothing they do with the events flows back into the core.

use std::collections::VecDeque;

use serde::Serialize;

use crate::hit::{BeatEvent, ComboRecord, CycleIndex, Hit};
use crate::time::TimeUs;

/// Why a raw input did not produce a recorded hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// No slot window contains the press time.
    NoWindow,
    /// The best window belongs to a cycle before the anchor.
    NegativeCycle,
    /// The slot was already filled by an earlier press.
    DuplicateSlot,
    /// The cycle's record has already been evicted.
    CycleEvicted,
    /// The cycle's combo has already been cast.
    AlreadyCast,
    /// Recording is disabled (before rhythm start, after reset, after a loop).
    InputDisabled,
    /// The input id has no binding.
    UnboundInput,
    /// The clock is not running.
    ClockStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CueKind {
    /// First beat of a cycle.
    Bar,
    Beat,
    Hit,
    Cast,
    /// Demonstration hit played during the tutorial cycles.
    TutorialHit,
}

/// A sound the audio collaborator should play at `at_us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioCue {
    pub kind: CueKind,
    pub at_us: TimeUs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RhythmEvent {
    Beat(BeatEvent),
    HitRecorded(Hit),
    ComboReady(ComboRecord),
    #[serde(rename_all = "camelCase")]
    InputRejected {
        input_id: String,
        time_us: TimeUs,
        reason: RejectReason,
    },
    #[serde(rename_all = "camelCase")]
    SongLoaded {
        title: String,
        version: u64,
        music_start_us: TimeUs,
        rhythm_start_us: TimeUs,
    },
    #[serde(rename_all = "camelCase")]
    InputArmed { version: u64, at_us: TimeUs },
    #[serde(rename_all = "camelCase")]
    LoopResynced {
        loop_index: u64,
        boundary_us: TimeUs,
        rhythm_start_us: TimeUs,
    },
    #[serde(rename_all = "camelCase")]
    LateRearm {
        scheduled_us: TimeUs,
        clamped_us: TimeUs,
    },
    #[serde(rename_all = "camelCase")]
    TutorialEnded { cycle_index: CycleIndex },
    #[serde(rename_all = "camelCase")]
    SongEnded { title: String, at_us: TimeUs },
    Cue(AudioCue),
}

/// FIFO of events produced by the core.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<RhythmEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RhythmEvent) {
        self.events.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = RhythmEvent>) {
        self.events.extend(events);
    }

    /// Remove and return every queued event in emission order.
    pub fn drain(&mut self) -> Vec<RhythmEvent> {
        self.events.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RhythmEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut queue = EventQueue::new();
        queue.push(RhythmEvent::TutorialEnded { cycle_index: 1 });
        queue.push(RhythmEvent::Cue(AudioCue {
            kind: CueKind::Bar,
            at_us: 10,
        }));
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(
            drained[0],
            RhythmEvent::TutorialEnded { cycle_index: 1 }
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = RhythmEvent::InputRejected {
            input_id: "KeyJ".to_string(),
            time_us: 5,
            reason: RejectReason::NoWindow,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"inputRejected""#));
        assert!(json.contains(r#""inputId":"KeyJ""#));
        assert!(json.contains(r#""reason":"noWindow""#));
    }
}
