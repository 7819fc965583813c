// [libs/domain/models/src/tests_serialization.rs]
//! Certifica que los tipos soberanos (de)serializan sin pérdida y que las
//! invariantes de Stage/fingerprint se mantienen bajo round-trip JSON.

use narrata_domain_models::job::{BlobHandle, FeatureToggles, Job, JobConfig, Stage};
use narrata_domain_models::segment::{Segment, SegmentFingerprint};

fn sample_job() -> Job {
    Job::new_pending(
        "owner-123".to_string(),
        BlobHandle("blob://source/abc".to_string()),
        JobConfig {
            override_script: None,
            target_duration_minutes: Some(6.0),
            series_id: Some("my-series".to_string()),
            feature_toggles: FeatureToggles::default(),
            character_guide_text: None,
            source_duration_seconds: 360.0,
        },
    )
}

#[test]
fn job_round_trips_through_json() {
    let job = sample_job();
    let encoded = serde_json::to_string(&job).expect("job must serialize");
    let decoded: Job = serde_json::from_str(&encoded).expect("job must deserialize");
    assert_eq!(decoded.id, job.id);
    assert_eq!(decoded.stage, Stage::Pending);
    assert_eq!(decoded.progress, 0);
}

#[test]
fn stage_progress_budget_covers_full_range_without_gaps() {
    let ordered = [
        Stage::Pending,
        Stage::Reserving,
        Stage::Ingesting,
        Stage::Planning,
        Stage::SegmentProcessing,
        Stage::Stitching,
        Stage::Committing,
    ];
    let mut previous_ceiling = 0u8;
    for stage in ordered {
        let (floor, ceiling) = stage.progress_budget();
        assert!(floor >= previous_ceiling || stage == Stage::Pending);
        assert!(ceiling <= 100);
        previous_ceiling = ceiling;
    }
    assert_eq!(Stage::Committing.progress_budget().1, 100);
}

#[test]
fn terminal_stages_are_tagged_terminal() {
    assert!(Stage::Completed.is_terminal());
    assert!(Stage::Failed.is_terminal());
    assert!(Stage::Cancelled.is_terminal());
    assert!(!Stage::SegmentProcessing.is_terminal());
}

#[test]
fn fingerprint_is_deterministic_for_identical_inputs() {
    let job = sample_job();
    let first = SegmentFingerprint::compute(job.id, 0, 0.0, 5.0, None);
    let second = SegmentFingerprint::compute(job.id, 0, 0.0, 5.0, None);
    assert_eq!(first, second);
}

#[test]
fn fingerprint_changes_with_script_override_text() {
    let job = sample_job();
    let without_script = SegmentFingerprint::compute(job.id, 0, 0.0, 5.0, None);
    let with_script = SegmentFingerprint::compute(job.id, 0, 0.0, 5.0, Some("paragraph-hash"));
    assert_ne!(without_script, with_script);
}

#[test]
fn segment_duration_is_end_minus_start() {
    let job = sample_job();
    let segment = Segment::planned(job.id, 2, 10.0, 14.5, None);
    assert_eq!(segment.duration(), 4.5);
}

#[test]
#[should_panic(expected = "strictly after")]
fn segment_rejects_non_positive_duration() {
    let job = sample_job();
    let _ = Segment::planned(job.id, 0, 5.0, 5.0, None);
}
