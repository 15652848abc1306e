// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scanning pipeline lifecycle and event
//! delivery, driven through the public API with mock devices and a
//! scripted recognizer.

mod common;

use common::{
    CameraStats, FRAME_HEIGHT, FRAME_WIDTH, Recorded, RecordingSubscriber, ScriptedRecognizer,
    failing_factory, good_candidate, mock_factory,
};
use idscan::errors::OcrError;
use idscan::{PipelineState, ScanConfig, ScanError, ScanPipeline};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

/// Config tuned for fast, deterministic tests: high capture rate, no
/// throttling
fn fast_config() -> ScanConfig {
    ScanConfig {
        target_fps: 200.0,
        ..Default::default()
    }
}

fn build_pipeline(
    config: ScanConfig,
    stats: &Arc<CameraStats>,
    recognizer: ScriptedRecognizer,
    subscriber: &Arc<RecordingSubscriber>,
) -> ScanPipeline {
    ScanPipeline::new(
        config,
        mock_factory(Arc::clone(stats)),
        Arc::new(recognizer),
        Arc::clone(subscriber) as Arc<dyn idscan::ScanSubscriber>,
    )
    .expect("valid config")
}

#[test]
fn test_start_is_idempotent() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let mut pipeline = build_pipeline(
        fast_config(),
        &stats,
        ScriptedRecognizer::empty(),
        &subscriber,
    );

    pipeline.start().expect("first start");
    pipeline.start().expect("second start is a no-op");

    assert_eq!(pipeline.state(), PipelineState::Running);
    assert_eq!(
        stats.opens.load(Ordering::SeqCst),
        1,
        "second start must not reopen the device"
    );

    pipeline.stop();
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_stop_is_idempotent_and_releases_device() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let mut pipeline = build_pipeline(
        fast_config(),
        &stats,
        ScriptedRecognizer::empty(),
        &subscriber,
    );

    pipeline.start().expect("start");
    pipeline.stop();
    pipeline.stop(); // no-op

    assert_eq!(stats.closes.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_restart_is_a_fresh_acquisition() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    // A huge recognition interval: only the very first frame of a run is
    // ever admitted, so a second recognition after restart proves the
    // throttle state did not carry over
    let config = ScanConfig {
        target_fps: 200.0,
        recognition_interval: Duration::from_secs(3600),
        ..Default::default()
    };
    let recognizer = ScriptedRecognizer::empty();
    let mut pipeline = build_pipeline(config, &stats, recognizer, &subscriber);

    pipeline.start().expect("first start");
    assert!(
        subscriber.wait_until(Duration::from_secs(2), |events| {
            events.iter().any(|e| matches!(e, Recorded::Failed))
        }),
        "first run should complete one recognition cycle"
    );
    pipeline.stop();
    let cycles_after_first_run = subscriber
        .outcomes()
        .len();

    pipeline.start().expect("restart");
    assert!(
        subscriber.wait_until(Duration::from_secs(2), |events| {
            events
                .iter()
                .filter(|e| !matches!(e, Recorded::FrameUpdate(_)))
                .count()
                > cycles_after_first_run
        }),
        "restart should admit a frame immediately despite the interval"
    );
    pipeline.stop();

    assert_eq!(stats.opens.load(Ordering::SeqCst), 2);
    assert_eq!(stats.closes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_open_failure_is_synchronous_and_leaves_idle() {
    let subscriber = RecordingSubscriber::new();
    let mut pipeline = ScanPipeline::new(
        fast_config(),
        failing_factory(),
        Arc::new(ScriptedRecognizer::empty()),
        Arc::clone(&subscriber) as Arc<dyn idscan::ScanSubscriber>,
    )
    .expect("valid config");

    let result = pipeline.start();
    assert!(matches!(result, Err(ScanError::Device(_))));
    assert_eq!(pipeline.state(), PipelineState::Idle);

    // No loops were launched, so no events can ever arrive
    thread::sleep(Duration::from_millis(100));
    assert!(subscriber.snapshot().is_empty());
}

#[test]
fn test_found_event_carries_identifier() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let recognizer = ScriptedRecognizer::new(vec![Ok(vec![good_candidate("123456789")])]);
    let mut pipeline = build_pipeline(fast_config(), &stats, recognizer, &subscriber);

    pipeline.start().expect("start");
    let delivered = subscriber.wait_until(Duration::from_secs(2), |events| {
        events
            .iter()
            .any(|e| matches!(e, Recorded::Found(id) if id == "123456789"))
    });
    pipeline.stop();

    assert!(delivered, "Found event with the identifier was not delivered");
}

#[test]
fn test_filter_outcomes_in_cycle_order() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    // Cycle 1: accepted. Cycle 2: no candidates. Cycle 3: engine error.
    // Every later cycle returns no candidates.
    let recognizer = ScriptedRecognizer::new(vec![
        Ok(vec![good_candidate("987654321")]),
        Ok(Vec::new()),
        Err(OcrError::InvocationFailed("mock engine crash".into())),
    ]);
    let mut pipeline = build_pipeline(fast_config(), &stats, recognizer, &subscriber);

    pipeline.start().expect("start");
    assert!(
        subscriber.wait_until(Duration::from_secs(2), |events| {
            events
                .iter()
                .filter(|e| !matches!(e, Recorded::FrameUpdate(_)))
                .count()
                >= 3
        }),
        "three recognition cycles should complete"
    );
    pipeline.stop();

    let outcomes = subscriber.outcomes();
    assert_eq!(outcomes[0], Recorded::Found("987654321".to_string()));
    assert_eq!(outcomes[1], Recorded::Failed);
    assert_eq!(outcomes[2], Recorded::Failed, "engine error counts as Failed");
}

#[test]
fn test_exactly_one_outcome_per_cycle() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let recognizer = Arc::new(ScriptedRecognizer::new(vec![
        Ok(vec![good_candidate("111222333")]),
        Err(OcrError::InvocationFailed("mock".into())),
    ]));
    let mut pipeline = ScanPipeline::new(
        fast_config(),
        mock_factory(Arc::clone(&stats)),
        Arc::clone(&recognizer) as Arc<dyn idscan::ocr::TextRecognizer>,
        Arc::clone(&subscriber) as Arc<dyn idscan::ScanSubscriber>,
    )
    .expect("valid config");

    pipeline.start().expect("start");
    subscriber.wait_until(Duration::from_millis(500), |events| {
        events
            .iter()
            .filter(|e| !matches!(e, Recorded::FrameUpdate(_)))
            .count()
            >= 5
    });
    pipeline.stop();

    // After stop, every completed cycle has delivered its event
    let cycles = recognizer.calls.load(Ordering::SeqCst);
    let outcomes = subscriber.outcomes().len();
    assert_eq!(
        outcomes, cycles,
        "each completed cycle must emit exactly one of Found/Failed"
    );
}

#[test]
fn test_preview_frames_are_decodable_jpeg() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let mut pipeline = build_pipeline(
        fast_config(),
        &stats,
        ScriptedRecognizer::empty(),
        &subscriber,
    );

    pipeline.start().expect("start");
    assert!(
        subscriber.wait_until(Duration::from_secs(2), |events| {
            events.iter().any(|e| matches!(e, Recorded::FrameUpdate(_)))
        }),
        "no preview frame arrived"
    );
    pipeline.stop();

    let jpeg = subscriber
        .snapshot()
        .into_iter()
        .find_map(|e| match e {
            Recorded::FrameUpdate(bytes) => Some(bytes),
            _ => None,
        })
        .expect("preview bytes");

    let decoded = image::load_from_memory(&jpeg).expect("preview should be valid JPEG");
    assert_eq!(decoded.width(), FRAME_WIDTH);
    assert_eq!(decoded.height(), FRAME_HEIGHT);
}

#[test]
fn test_skip_rate_reconfigure_takes_effect_without_restart() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    // Effectively no submissions beyond the first frame
    let config = ScanConfig {
        target_fps: 200.0,
        frame_skip_rate: 1_000_000,
        ..Default::default()
    };
    let recognizer = Arc::new(ScriptedRecognizer::empty());
    let mut pipeline = ScanPipeline::new(
        config.clone(),
        mock_factory(Arc::clone(&stats)),
        Arc::clone(&recognizer) as Arc<dyn idscan::ocr::TextRecognizer>,
        Arc::clone(&subscriber) as Arc<dyn idscan::ScanSubscriber>,
    )
    .expect("valid config");

    pipeline.start().expect("start");
    thread::sleep(Duration::from_millis(200));
    let calls_before = recognizer.calls.load(Ordering::SeqCst);
    assert!(calls_before <= 1, "skip rate should suppress submissions");

    pipeline
        .reconfigure(ScanConfig {
            frame_skip_rate: 1,
            ..config
        })
        .expect("valid reconfigure");

    thread::sleep(Duration::from_millis(300));
    let calls_after = recognizer.calls.load(Ordering::SeqCst);
    pipeline.stop();

    assert!(
        calls_after > calls_before + 3,
        "lowering frame_skip_rate should increase submissions (before {}, after {})",
        calls_before,
        calls_after
    );
}

#[test]
fn test_reconfigure_rejects_invalid_values() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let pipeline = build_pipeline(
        fast_config(),
        &stats,
        ScriptedRecognizer::empty(),
        &subscriber,
    );

    let bad = ScanConfig {
        resize_factor: 2.0,
        ..Default::default()
    };
    assert!(pipeline.reconfigure(bad).is_err());
    // The stored config is untouched
    assert_eq!(pipeline.config().resize_factor, 1.0);
}

#[test]
fn test_capture_rate_tracks_target_fps() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let config = ScanConfig {
        target_fps: 50.0,
        // Keep recognition out of the picture
        frame_skip_rate: 1_000_000,
        ..Default::default()
    };
    let mut pipeline = build_pipeline(config, &stats, ScriptedRecognizer::empty(), &subscriber);

    pipeline.start().expect("start");
    thread::sleep(Duration::from_millis(400));
    pipeline.stop();

    // 50 fps over 400ms is ~20 ticks; allow wide scheduler jitter
    let reads = stats.reads.load(Ordering::SeqCst);
    assert!(
        (8..=35).contains(&reads),
        "expected roughly 20 reads at 50fps over 400ms, got {}",
        reads
    );
}

#[test]
fn test_downscaled_submission_found_still_reported() {
    let stats = Arc::new(CameraStats::default());
    let subscriber = RecordingSubscriber::new();
    let config = ScanConfig {
        target_fps: 200.0,
        resize_factor: 0.5,
        ..Default::default()
    };
    let recognizer = ScriptedRecognizer::new(vec![Ok(vec![good_candidate("555666777")])]);
    let mut pipeline = build_pipeline(config, &stats, recognizer, &subscriber);

    pipeline.start().expect("start");
    let delivered = subscriber.wait_until(Duration::from_secs(2), |events| {
        events
            .iter()
            .any(|e| matches!(e, Recorded::Found(id) if id == "555666777"))
    });
    pipeline.stop();

    assert!(delivered);
}
