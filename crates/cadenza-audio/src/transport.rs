use std::cell::Cell;

use anyhow::{Result, bail};

use cadenza_types::{ClipInfo, TimeUs};

/// Abstraction over the audio output that plays the backing track.
/// Implementations: ManualTransport (simulation, testing).
pub trait AudioTransport {
    /// Current position of the audio clock.
    fn current_time_us(&self) -> TimeUs;

    /// Start playing `clip` at `at_us` on the audio clock.
    fn schedule_start(&mut self, clip: ClipInfo, at_us: TimeUs, looped: bool) -> Result<()>;

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    clip: ClipInfo,
    at_us: TimeUs,
    looped: bool,
}

/// Transport whose clock is advanced by hand.
#[derive(Debug, Default)]
pub struct ManualTransport {
    now_us: Cell<TimeUs>,
    scheduled: Option<Scheduled>,
}

impl ManualTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, us: TimeUs) {
        self.now_us.set(us);
    }

    pub fn advance(&self, delta_us: TimeUs) {
        self.now_us.set(self.now_us.get() + delta_us);
    }

    /// Scheduled start time of the current clip, if any.
    pub fn scheduled_start_us(&self) -> Option<TimeUs> {
        self.scheduled.map(|s| s.at_us)
    }
}

impl AudioTransport for ManualTransport {
    fn current_time_us(&self) -> TimeUs {
        self.now_us.get()
    }

    fn schedule_start(&mut self, clip: ClipInfo, at_us: TimeUs, looped: bool) -> Result<()> {
        if at_us < self.now_us.get() {
            bail!(
                "cannot schedule playback in the past ({at_us}us < {}us)",
                self.now_us.get()
            );
        }
        self.scheduled = Some(Scheduled {
            clip,
            at_us,
            looped,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.scheduled = None;
    }

    fn is_playing(&self) -> bool {
        let now = self.now_us.get();
        match self.scheduled {
            Some(s) => now >= s.at_us && (s.looped || now < s.at_us + s.clip.duration_us()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ClipInfo {
        ClipInfo::new(441_000, 44_100).unwrap()
    }

    #[test]
    fn plays_between_start_and_end() {
        let mut t = ManualTransport::new();
        t.schedule_start(clip(), 1_000_000, false).unwrap();
        assert!(!t.is_playing());
        t.set_time(1_000_000);
        assert!(t.is_playing());
        t.advance(10_000_000);
        assert!(!t.is_playing());
    }

    #[test]
    fn looped_clip_keeps_playing_until_stopped() {
        let mut t = ManualTransport::new();
        t.schedule_start(clip(), 0, true).unwrap();
        t.set_time(95_000_000);
        assert!(t.is_playing());
        t.stop();
        assert!(!t.is_playing());
        assert_eq!(t.scheduled_start_us(), None);
    }

    #[test]
    fn scheduling_in_the_past_fails() {
        let mut t = ManualTransport::new();
        t.set_time(5_000);
        assert!(t.schedule_start(clip(), 4_999, true).is_err());
    }
}
