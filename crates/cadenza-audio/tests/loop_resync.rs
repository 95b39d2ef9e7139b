use cadenza_audio::{AudioSyncController, CueScheduler, ManualTransport, RhythmTarget};
use cadenza_types::{
    ClipInfo, ConfigError, CueConfig, EventQueue, RhythmEvent, SongData, SyncConfig, TimeUs,
};
use proptest::prelude::*;

#[derive(Default)]
struct Starts(Vec<TimeUs>);

impl RhythmTarget for Starts {
    fn stop_rhythm(&mut self) {}

    fn start_rhythm_at(&mut self, anchor_us: TimeUs, _now_us: TimeUs) {
        self.0.push(anchor_us);
    }

    fn reset_rhythm_state(&mut self) {}

    fn set_input_enabled(&mut self, _recording: bool, _casting: bool) {}

    fn apply_song(&mut self, _song: &SongData) -> Result<(), ConfigError> {
        Ok(())
    }
}

proptest! {
    #[test]
    fn loop_boundaries_follow_clip_length(
        sample_count in 22_050u64..2_000_000,
        sample_rate in prop::sample::select(vec![22_050u32, 44_100, 48_000, 96_000]),
        offset_ms in 0u32..2_000,
        steps in proptest::collection::vec(1i64..3_000_000, 1..200),
    ) {
        let clip = ClipInfo::new(sample_count, sample_rate).unwrap();
        let song = SongData {
            title: "Prop".to_string(),
            beat0_offset_secs: offset_ms as f64 / 1000.0,
            ..Default::default()
        };
        let config = SyncConfig::default();
        let mut sync = AudioSyncController::new(
            ManualTransport::new(),
            config.clone(),
            CueScheduler::new(&CueConfig::default()),
            4,
        );
        let mut target = Starts::default();
        let mut events = EventQueue::new();
        sync.load(song, clip, true, &mut target, &mut events).unwrap();

        let mut now = 0;
        for step in steps {
            now += step;
            sync.transport().set_time(now);
            sync.tick(&mut target, &mut events).unwrap();
        }

        prop_assert!(target.0.iter().all(|&s| s >= 0));
        prop_assert!(target.0.windows(2).all(|w| w[0] <= w[1]));

        let Some(music_start) = sync.music_start_us() else {
            return Ok(());
        };
        prop_assert!(music_start >= config.intro_delay_us(true) + config.schedule_lead_us());
        let mut previous = music_start;
        for event in events.drain() {
            if let RhythmEvent::LoopResynced { loop_index, boundary_us, .. } = event {
                prop_assert_eq!(boundary_us, music_start + clip.loop_offset_us(loop_index));
                prop_assert!((boundary_us - previous - clip.duration_us()).abs() <= 1);
                previous = boundary_us;
            }
        }
    }
}

#[test]
fn ten_second_clip_reanchors_at_ten_point_two() {
    let config = SyncConfig {
        schedule_lead_secs: 0.0,
        initial_intro_delay_secs: 0.0,
        ..Default::default()
    };
    let mut sync = AudioSyncController::new(
        ManualTransport::new(),
        config,
        CueScheduler::new(&CueConfig::default()),
        4,
    );
    let song = SongData {
        title: "Ten".to_string(),
        beat0_offset_secs: 0.2,
        ..Default::default()
    };
    let mut target = Starts::default();
    let mut events = EventQueue::new();
    sync.load(song, ClipInfo::new(441_000, 44_100).unwrap(), true, &mut target, &mut events)
        .unwrap();
    assert_eq!(sync.music_start_us(), Some(0));

    for t in (0..=10_000_000).step_by(16_667) {
        sync.transport().set_time(t);
        sync.tick(&mut target, &mut events).unwrap();
    }
    sync.transport().set_time(10_000_000);
    sync.tick(&mut target, &mut events).unwrap();

    assert_eq!(sync.rhythm_start_us(), Some(10_200_000));
    assert_eq!(target.0, vec![200_000, 10_200_000]);
}
