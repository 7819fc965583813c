// [tests/mirror/libs/infra/job_store/segment_idempotence.test.rs]
//! Un segmento ya marcado `done` debe poder localizarse por su fingerprint
//! incluso después de que el job que lo planificó se recupere de una caída
//! simulada — es la base de la regla "completed segments are skipped".

use narrata_domain_models::{BlobHandle, JobId, Segment, SegmentOutcome, SegmentStatus};
use narrata_infra_job_store::{JobStoreClient, SegmentRepository};

fn outcome() -> SegmentOutcome {
    SegmentOutcome {
        narration_text: "once upon a time".to_string(),
        narration_audio: BlobHandle("blob://local/narration-0".to_string()),
        speed_factor: 1.0,
    }
}

#[tokio::test]
async fn a_completed_segment_is_found_by_fingerprint_after_recovery() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = SegmentRepository::new(client);

    let job_id = JobId::new();
    let plan = vec![
        Segment::planned(job_id, 0, 0.0, 10.0, None),
        Segment::planned(job_id, 1, 10.0, 20.0, None),
    ];
    repository.insert_plan(&plan).await.expect("insert_plan");

    let fingerprint = plan[0].fingerprint;
    assert!(repository.find_completed_by_fingerprint(fingerprint).await.expect("lookup").is_none());

    repository.mark_in_progress(job_id, 0, SegmentStatus::Describing).await.expect("mark_in_progress");
    repository.mark_done(job_id, 0, &outcome()).await.expect("mark_done");

    let recovered = repository
        .find_completed_by_fingerprint(fingerprint)
        .await
        .expect("lookup after done")
        .expect("segment must be found once done");
    assert_eq!(recovered.status, SegmentStatus::Done);
    assert_eq!(recovered.outcome.expect("outcome present").narration_text, "once upon a time");
}

#[tokio::test]
async fn segments_for_a_job_are_listed_in_planned_order() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = SegmentRepository::new(client);

    let job_id = JobId::new();
    let plan = vec![
        Segment::planned(job_id, 0, 0.0, 10.0, None),
        Segment::planned(job_id, 1, 10.0, 20.0, None),
        Segment::planned(job_id, 2, 20.0, 30.0, None),
    ];
    repository.insert_plan(&plan).await.expect("insert_plan");

    let listed = repository.list_for_job(job_id).await.expect("list_for_job");
    let indices: Vec<u32> = listed.iter().map(|segment| segment.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn a_failed_segment_records_its_error_and_can_be_retried_into_done() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = SegmentRepository::new(client);

    let job_id = JobId::new();
    let plan = vec![Segment::planned(job_id, 0, 0.0, 10.0, None)];
    repository.insert_plan(&plan).await.expect("insert_plan");

    let failure = narrata_domain_models::SegmentError {
        kind: narrata_domain_models::ErrorKind::ProviderTransient,
        message: "vision provider timed out".to_string(),
    };
    repository.mark_failed(job_id, 0, &failure).await.expect("mark_failed");

    let fetched = repository.get(job_id, 0).await.expect("get");
    assert_eq!(fetched.status, SegmentStatus::Failed);
    assert_eq!(fetched.error.expect("error present").message, "vision provider timed out");

    repository.mark_done(job_id, 0, &outcome()).await.expect("retry into done");
    let retried = repository.get(job_id, 0).await.expect("get after retry");
    assert_eq!(retried.status, SegmentStatus::Done);
    assert!(retried.error.is_none(), "mark_done clears a prior failure");
}
