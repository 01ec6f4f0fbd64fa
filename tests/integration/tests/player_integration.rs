//! Integration tests for the stereoplay engine
//!
//! These tests drive a complete engine through its public API:
//! - Start, pause and resume against a manual clock
//! - Frame dropping against a scripted audio clock
//! - Seeking, stream switching and parameter commands
//! - Master election and the driver thread

use anyhow::Result;
use mockall::mock;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use stereoplay::bus::{Change, Command, Notification, WireFormat};
use stereoplay::decoder::{SyntheticMedia, SyntheticSource};
use stereoplay::media::{Parameters, StereoMode, VideoFrame};
use stereoplay::player::{
    Driver, MasterRegistry, PlaybackEngineBuilder, PlaybackState, PlayerInitData,
};
use stereoplay::renderer::VideoSink;
use stereoplay::StereoPlayError;
use std::sync::atomic::Ordering;
use stereoplay_integration_tests::{
    open_engine, RecordingSubscriber, RecordingVideoSink, ScriptedAudioSink, SinkCall,
    TrackedSource,
};

#[test]
fn test_pause_suspends_time() -> Result<()> {
    let (mut engine, log, time) = open_engine(SyntheticMedia::new(2_000_000, 25))?;
    let subscriber = RecordingSubscriber::new();
    let _subscription = engine.register(subscriber.clone());

    let first = engine.run_step()?;
    assert!(first.stage_frame);
    assert_eq!(log.lock().last(), Some(&SinkCall::Prepare(Some(0))));

    // start read, show frame 0, read frame 1, start read, wait
    for _ in 0..4 {
        engine.run_step()?;
    }
    assert!(!engine.run_step()?.advisory_sleep.is_zero());
    time.advance(20_000);
    engine.run_step()?;
    assert_eq!(engine.media_time(), 20_000);

    engine.receive_command(Command::TogglePause)?;
    engine.run_step()?;
    assert_eq!(engine.state(), PlaybackState::Paused);
    assert_eq!(subscriber.pause_changes(), vec![(false, true)]);

    let position = engine.position();
    for _ in 0..10 {
        time.advance(100_000);
        let outcome = engine.run_step()?;
        assert!(outcome.more_work);
        assert!(!outcome.display_frame && !outcome.stage_frame);
        assert_eq!(engine.position(), position);
        assert_eq!(engine.media_time(), 20_000);
    }

    engine.receive_command(Command::TogglePause)?;
    let resumed = engine.run_step()?;
    assert!(!resumed.display_frame);
    assert!(!resumed.advisory_sleep.is_zero());
    assert_eq!(engine.media_time(), 20_000);
    assert_eq!(subscriber.pause_changes(), vec![(false, true), (true, false)]);

    time.advance(20_000);
    assert!(engine.run_step()?.display_frame);
    assert_eq!(engine.state(), PlaybackState::Streaming);
    Ok(())
}

#[test]
fn test_lagging_audio_clock_drops_next_frame() -> Result<()> {
    let (sink, log) = RecordingVideoSink::new();
    let (audio, clock) = ScriptedAudioSink::new();
    let media = SyntheticMedia::new(2_000_000, 25).with_audio_streams(1);
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(media))
        .with_audio_sink(audio)
        .with_video_sink(sink)
        .build();
    engine.open(&PlayerInitData::default())?;

    assert!(engine.run_step()?.stage_frame);
    engine.run_step()?;
    assert!(engine.run_step()?.display_frame);
    assert!(engine.run_step()?.stage_frame);
    engine.run_step()?;

    // frame 1 is due at 40 ms; the device is already 35 ms past it
    clock.set(75_000);
    let late = engine.run_step()?;
    assert!(late.display_frame);
    assert_eq!(engine.media_time(), 75_000);

    let next = engine.run_step()?;
    assert!(next.drop_frame);
    assert!(!next.stage_frame);

    let prepared: Vec<SinkCall> = log
        .lock()
        .iter()
        .filter(|call| matches!(call, SinkCall::Prepare(_)))
        .cloned()
        .collect();
    assert_eq!(
        prepared,
        vec![SinkCall::Prepare(Some(0)), SinkCall::Prepare(Some(40_000))]
    );

    engine.receive_command(Command::TogglePause)?;
    engine.run_step()?;
    assert!(clock.is_paused());
    Ok(())
}

#[test]
fn test_set_pos_is_idempotent() -> Result<()> {
    let media = SyntheticMedia::new(10_000_000, 25)
        .with_start_time(1_000_000)
        .with_initial_skip(500_000);
    let (mut engine, _log, _time) = open_engine(media)?;
    assert_eq!(engine.run_step()?.seek_target, Some(1_500_000));

    for _ in 0..2 {
        engine.receive_command(Command::SetPos(1.0))?;
        assert_eq!(engine.run_step()?.seek_target, Some(9_500_000));
    }
    for _ in 0..2 {
        engine.receive_command(Command::SetPos(0.0))?;
        assert_eq!(engine.run_step()?.seek_target, Some(1_500_000));
        assert_eq!(engine.position(), 0.0);
    }

    engine.receive_command(Command::Seek(-30.0))?;
    assert_eq!(engine.run_step()?.seek_target, Some(1_500_000));
    Ok(())
}

#[test]
fn test_single_stream_cycles_are_noops() -> Result<()> {
    let (mut engine, _log, _time) = open_engine(SyntheticMedia::default())?;
    engine.run_step()?;
    let subscriber = RecordingSubscriber::new();
    let _subscription = engine.register(subscriber.clone());

    engine.receive_command(Command::CycleVideoStream)?;
    engine.receive_command(Command::CycleAudioStream)?;
    engine.receive_command(Command::CycleSubtitleStream)?;

    assert!(subscriber.notifications().is_empty());
    assert_eq!(engine.state(), PlaybackState::Streaming);
    Ok(())
}

#[test]
fn test_subtitle_switch_resyncs() -> Result<()> {
    let (mut engine, _log, _time) = open_engine(SyntheticMedia::default().with_subtitle_streams(3))?;
    engine.run_step()?;
    assert!(engine.video_frame().subtitle.is_none());
    let subscriber = RecordingSubscriber::new();
    let _subscription = engine.register(subscriber.clone());

    engine.receive_command(Command::CycleSubtitleStream)?;
    assert_eq!(engine.state(), PlaybackState::Seeking);
    assert_eq!(engine.run_step()?.seek_target, Some(0));
    assert!(engine.video_frame().subtitle.is_some());

    engine.receive_command(Command::SetSubtitleStream(7))?;
    engine.receive_command(Command::CycleSubtitleStream)?;
    let streams: Vec<Change<Option<usize>>> = subscriber
        .notifications()
        .into_iter()
        .filter_map(|n| match n {
            Notification::SubtitleStream(change) => Some(change),
            _ => None,
        })
        .collect();
    assert_eq!(
        streams,
        vec![Change::new(None, Some(0)), Change::new(Some(0), Some(1))]
    );
    Ok(())
}

#[test]
fn test_adjustments_clamp() -> Result<()> {
    let (mut engine, _log, _time) = open_engine(SyntheticMedia::default())?;
    let subscriber = RecordingSubscriber::new();
    let _subscription = engine.register(subscriber.clone());

    let deltas = [0.4, 0.4, 0.4, -0.9, -0.9, -0.9, 0.25];
    let mut expected = Vec::new();
    for delta in deltas {
        let old = engine.parameters().parallax();
        engine.receive_command(Command::AdjustParallax(delta))?;
        let new = (old + delta).clamp(-1.0, 1.0);
        assert_eq!(engine.parameters().parallax(), new);
        expected.push(Notification::Parallax(Change::new(old, new)));
    }
    assert_eq!(subscriber.notifications(), expected);

    subscriber.clear();
    engine.receive_command(Command::SetGhostbust(-2.0))?;
    engine.receive_command(Command::AdjustGhostbust(0.5))?;
    assert_eq!(
        subscriber.notifications(),
        vec![
            Notification::Ghostbust(Change::new(0.0, 0.0)),
            Notification::Ghostbust(Change::new(0.0, 0.5)),
        ]
    );
    Ok(())
}

#[test]
fn test_quit_flushes_outputs() -> Result<()> {
    let (mut engine, log, _time) = open_engine(SyntheticMedia::default())?;
    engine.receive_command(Command::ToggleFullscreen)?;
    engine.run_step()?;
    engine.receive_command(Command::TogglePlay)?;
    assert!(!engine.run_step()?.more_work);
    engine.close();

    let calls = log.lock().clone();
    let tail = &calls[calls.len() - 4..];
    assert_eq!(
        tail,
        [
            SinkCall::ExitFullscreen,
            SinkCall::Prepare(None),
            SinkCall::Activate,
            SinkCall::Deinit,
        ]
    );
    assert_eq!(engine.state(), PlaybackState::Closed);
    Ok(())
}

#[test]
fn test_open_from_snapshot() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("player.json");
    let mut init = PlayerInitData {
        urls: vec!["synthetic:".to_string()],
        fullscreen: true,
        center: true,
        ..PlayerInitData::default()
    };
    init.params.set_contrast(0.25);
    std::fs::write(&path, init.encode()?)?;

    let restored = PlayerInitData::decode(&std::fs::read(&path)?)?;
    assert_eq!(restored, init);

    let (sink, log) = RecordingVideoSink::new();
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(SyntheticMedia::default()))
        .with_video_sink(sink)
        .build();
    engine.open(&restored)?;
    assert_eq!(engine.parameters().contrast(), 0.25);
    assert_eq!(
        log.lock()[..],
        [
            SinkCall::Init,
            SinkCall::SetParameters,
            SinkCall::SetSuitableSize(640, 360),
            SinkCall::EnterFullscreen,
            SinkCall::Center,
        ][..]
    );
    Ok(())
}

#[test]
fn test_open_rejects_bad_streams() {
    let (sink, _log) = RecordingVideoSink::new();
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(SyntheticMedia::default()))
        .with_video_sink(sink)
        .build();
    let init = PlayerInitData {
        subtitle_stream: Some(0),
        ..PlayerInitData::default()
    };
    assert!(matches!(engine.open(&init), Err(StereoPlayError::NotFound(_))));
    assert_eq!(engine.state(), PlaybackState::Closed);
}

#[test]
fn test_failed_open_releases_source() {
    let (source, open) = TrackedSource::new(SyntheticMedia::default());
    let (sink, log) = RecordingVideoSink::new();
    let mut engine = PlaybackEngineBuilder::new(source).with_video_sink(sink).build();
    let init = PlayerInitData {
        video_stream: 3,
        ..PlayerInitData::default()
    };
    assert!(engine.open(&init).is_err());
    assert!(!open.load(Ordering::SeqCst));
    assert_eq!(*log.lock(), vec![SinkCall::Deinit]);
    drop(engine);
    assert!(!open.load(Ordering::SeqCst));
}

#[test]
#[serial]
fn test_global_master_is_exclusive() -> Result<()> {
    let registry = MasterRegistry::global();
    let token = registry.claim()?;
    assert!(matches!(registry.claim(), Err(StereoPlayError::MasterTaken)));

    let (mut engine, _log, _time) = open_engine(SyntheticMedia::default())?;
    engine.make_master(token);
    assert!(engine.is_master());
    engine.close();
    assert!(!registry.has_master());
    Ok(())
}

#[test]
#[serial]
fn test_master_commands_reach_driver() -> Result<()> {
    let media = SyntheticMedia::new(60_000_000, 25);
    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(media)).build();
    engine.open(&PlayerInitData::default())?;
    engine.make_master(MasterRegistry::global().claim()?);

    let handle = Driver::spawn(engine)?;
    MasterRegistry::global().send_command(Command::TogglePause)?;
    std::thread::sleep(Duration::from_millis(20));
    MasterRegistry::global().send_command(Command::TogglePlay)?;
    handle.join()?;

    assert!(!MasterRegistry::global().has_master());
    assert!(MasterRegistry::global().send_command(Command::Center).is_err());
    Ok(())
}

mock! {
    pub Sink {}

    impl VideoSink for Sink {
        fn init(&mut self) -> stereoplay::Result<()>;
        fn deinit(&mut self) -> stereoplay::Result<()>;
        fn supports_stereo(&self) -> bool;
        fn set_parameters(&mut self, params: &Parameters) -> stereoplay::Result<()>;
        fn set_suitable_size(
            &mut self,
            width: u32,
            height: u32,
            aspect_ratio: f32,
            mode: StereoMode,
        ) -> stereoplay::Result<()>;
        fn prepare_next_frame(&mut self, frame: &VideoFrame) -> stereoplay::Result<()>;
        fn activate_next_frame(&mut self) -> stereoplay::Result<()>;
        fn enter_fullscreen(&mut self) -> stereoplay::Result<()>;
        fn exit_fullscreen(&mut self) -> stereoplay::Result<()>;
        fn toggle_fullscreen(&mut self) -> stereoplay::Result<bool>;
        fn center(&mut self) -> stereoplay::Result<()>;
        fn has_events(&self) -> bool;
        fn process_events(&mut self) -> stereoplay::Result<()>;
    }
}

#[test]
fn test_video_sink_contract() -> Result<()> {
    let mut sink = MockSink::new();
    sink.expect_init().times(1).returning(|| Ok(()));
    sink.expect_supports_stereo().return_const(false);
    sink.expect_set_parameters().times(2).returning(|_| Ok(()));
    sink.expect_set_suitable_size()
        .withf(|w, h, _, mode| *w == 640 && *h == 360 && *mode == StereoMode::MonoLeft)
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    sink.expect_has_events().return_const(true);
    sink.expect_process_events().times(2).returning(|| Ok(()));
    sink.expect_prepare_next_frame()
        .withf(|frame| frame.presentation_time == 0 && frame.is_valid())
        .times(1)
        .returning(|_| Ok(()));
    sink.expect_deinit().times(1).returning(|| Ok(()));

    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(SyntheticMedia::default()))
        .with_video_sink(sink)
        .build();
    engine.open(&PlayerInitData::default())?;
    engine.run_step()?;
    engine.receive_command(Command::SetHue(0.5))?;
    engine.close();
    Ok(())
}

#[test]
fn test_failed_video_init_releases_audio() {
    let mut sink = MockSink::new();
    sink.expect_init()
        .times(1)
        .returning(|| Err(StereoPlayError::Video("no display".to_string())));
    sink.expect_deinit().times(1).returning(|| Ok(()));

    let (source, open) = TrackedSource::new(SyntheticMedia::default().with_audio_streams(1));
    let (audio, clock) = ScriptedAudioSink::new();
    let mut engine = PlaybackEngineBuilder::new(source)
        .with_audio_sink(audio)
        .with_video_sink(sink)
        .build();

    assert!(matches!(
        engine.open(&PlayerInitData::default()),
        Err(StereoPlayError::Video(_))
    ));
    assert!(!clock.is_initialized());
    assert!(!open.load(Ordering::SeqCst));
    assert_eq!(engine.state(), PlaybackState::Closed);
}

#[test]
fn test_stop_survives_failing_sink() -> Result<()> {
    let mut sink = MockSink::new();
    sink.expect_init().returning(|| Ok(()));
    sink.expect_supports_stereo().return_const(false);
    sink.expect_set_parameters().returning(|_| Ok(()));
    sink.expect_set_suitable_size().returning(|_, _, _, _| Ok(()));
    sink.expect_has_events().return_const(false);
    sink.expect_process_events().returning(|| Ok(()));
    sink.expect_prepare_next_frame().returning(|_| Ok(()));
    sink.expect_activate_next_frame().returning(|| Ok(()));
    sink.expect_exit_fullscreen()
        .times(1)
        .returning(|| Err(StereoPlayError::Video("display lost".to_string())));
    sink.expect_deinit().times(1).returning(|| Ok(()));

    let mut engine = PlaybackEngineBuilder::new(SyntheticSource::new(SyntheticMedia::default()))
        .with_video_sink(sink)
        .build();
    let subscriber = RecordingSubscriber::new();
    let _subscription = engine.register(subscriber.clone());
    engine.open(&PlayerInitData::default())?;
    engine.run_step()?;

    engine.receive_command(Command::TogglePlay)?;
    let outcome = engine.run_step()?;
    assert!(!outcome.more_work);
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!(
        subscriber.notifications().last(),
        Some(&Notification::Play(Change::new(true, false)))
    );
    engine.close();
    Ok(())
}

#[test]
fn test_subscribers_share_publisher() -> Result<()> {
    let (mut engine, _log, _time) = open_engine(SyntheticMedia::default())?;
    let first = RecordingSubscriber::new();
    let second = RecordingSubscriber::new();
    let _a = engine.register(first.clone());
    let b = engine.publisher().register(Arc::clone(&second) as Arc<dyn stereoplay::Subscriber>);

    engine.receive_command(Command::Center)?;
    b.cancel();
    engine.receive_command(Command::Center)?;

    assert_eq!(first.notifications().len(), 2);
    assert_eq!(second.notifications(), vec![Notification::Center]);
    Ok(())
}
