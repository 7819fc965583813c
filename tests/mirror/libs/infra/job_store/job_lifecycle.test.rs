// [tests/mirror/libs/infra/job_store/job_lifecycle.test.rs]
//! Ciclo de vida completo de un Job contra una base libSQL en memoria:
//! admisión, reclamación por un worker, avance de etapa con concurrencia
//! optimista, y escritura terminal.

use narrata_domain_models::{BlobHandle, FeatureToggles, Job, JobConfig, Stage};
use narrata_infra_job_store::{JobRepository, JobStoreClient};

fn sample_config() -> JobConfig {
    JobConfig {
        override_script: None,
        target_duration_minutes: None,
        series_id: None,
        feature_toggles: FeatureToggles::default(),
        character_guide_text: None,
        source_duration_seconds: 600.0,
    }
}

#[tokio::test]
async fn a_job_can_be_admitted_claimed_and_advanced_to_completion() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = JobRepository::new(client);

    let job = Job::new_pending("owner-1".to_string(), BlobHandle("blob://local/source".to_string()), sample_config());
    repository.create(&job).await.expect("create");

    let fetched = repository.get_snapshot(job.id).await.expect("get_snapshot");
    assert_eq!(fetched.stage, Stage::Pending);
    assert_eq!(fetched.revision, 0);

    let claimed = repository.claim(job.id, "worker-a", 30).await.expect("claim");
    assert_eq!(claimed.id, job.id);

    let mut reserving = claimed;
    reserving.stage = Stage::Reserving;
    reserving.progress = 1;
    reserving.current_step = "reserving quota".to_string();
    let after_reserve = repository.update(&reserving).await.expect("update to reserving");
    assert_eq!(after_reserve.stage, Stage::Reserving);
    assert_eq!(after_reserve.revision, 1);

    let mut completed = after_reserve;
    completed.stage = Stage::Completed;
    completed.progress = 100;
    completed.current_step = "done".to_string();
    completed.terminal_committed = true;
    completed.output_blob = Some(BlobHandle("blob://local/output".to_string()));
    completed.output_duration_seconds = Some(42.0);
    let terminal = repository.mark_terminal(&completed).await.expect("mark_terminal");
    assert_eq!(terminal.stage, Stage::Completed);
    assert!(terminal.terminal_committed);
    assert_eq!(terminal.revision, 2);
}

#[tokio::test]
async fn updating_with_a_stale_revision_is_rejected() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = JobRepository::new(client);

    let job = Job::new_pending("owner-1".to_string(), BlobHandle("blob://local/source".to_string()), sample_config());
    repository.create(&job).await.expect("create");

    let mut first_writer = job.clone();
    first_writer.progress = 5;
    repository.update(&first_writer).await.expect("first writer wins");

    let mut stale_writer = job;
    stale_writer.progress = 9;
    let outcome = repository.update(&stale_writer).await;
    assert!(matches!(outcome, Err(narrata_infra_job_store::DbError::RevisionConflict)));
}

#[tokio::test]
async fn a_second_worker_cannot_claim_a_job_under_an_active_lease() {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    let repository = JobRepository::new(client);

    let job = Job::new_pending("owner-1".to_string(), BlobHandle("blob://local/source".to_string()), sample_config());
    repository.create(&job).await.expect("create");

    repository.claim(job.id, "worker-a", 60).await.expect("first claim succeeds");
    let outcome = repository.claim(job.id, "worker-b", 60).await;
    assert!(matches!(outcome, Err(narrata_infra_job_store::DbError::LeaseConflict)));
}
