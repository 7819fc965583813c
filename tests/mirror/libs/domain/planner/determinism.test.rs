// [tests/mirror/libs/domain/planner/determinism.test.rs]
//! Para las mismas entradas, el Planner completo (guion, capítulos, modo
//! clip corto y selección por duración objetivo) siempre produce los mismos
//! límites e importancia en el mismo orden — propiedad de la que depende
//! toda la recuperación ante caídas del Pipeline Controller.

use async_trait::async_trait;
use narrata_domain_models::job::JobId;
use narrata_domain_models::{FeatureToggles, JobConfig, PlanLimits, SegmentConfig};
use narrata_domain_planner::{SegmentPlanner, CHAPTER_PROVIDER_ID};
use narrata_infra_provider_gate::clients::chapters::{ChapterProvider, SourceChapter};
use narrata_infra_provider_gate::{AttemptOutcome, ExternalCallGate};
use narrata_domain_models::ProviderConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct StubChapterProvider {
    chapters: Vec<SourceChapter>,
}

#[async_trait]
impl ChapterProvider for StubChapterProvider {
    async fn coarse_chapters(&self, _source_blob_url: &str) -> AttemptOutcome<Vec<SourceChapter>> {
        AttemptOutcome::Success(self.chapters.clone())
    }
}

fn blank_config(override_script: Option<&str>) -> JobConfig {
    JobConfig {
        override_script: override_script.map(str::to_string),
        target_duration_minutes: None,
        series_id: None,
        feature_toggles: FeatureToggles::default(),
        character_guide_text: None,
        source_duration_seconds: 600.0,
    }
}

fn gate() -> Arc<ExternalCallGate> {
    Arc::new(ExternalCallGate::new(vec![ProviderConfig::default_for(CHAPTER_PROVIDER_ID)]))
}

#[tokio::test]
async fn script_driven_plans_are_byte_identical_across_runs() {
    let job_id = JobId::new();
    let config = blank_config(Some("one.\n\ntwo, a bit longer than one.\n\nthree."));

    let planner = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters: vec![] }));
    let first = planner
        .plan(job_id, 90.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    let planner = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters: vec![] }));
    let second = planner
        .plan(job_id, 90.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}

#[tokio::test]
async fn chapter_driven_plans_are_identical_across_runs() {
    let job_id = JobId::new();
    let chapters = vec![
        SourceChapter { start_seconds: 0.0, end_seconds: 15.0, importance_score: 0.4 },
        SourceChapter { start_seconds: 15.0, end_seconds: 45.0, importance_score: 0.9 },
    ];
    let config = blank_config(None);

    let planner = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters: chapters.clone() }));
    let first = planner
        .plan(job_id, 45.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    let planner = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters }));
    let second = planner
        .plan(job_id, 45.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}

#[tokio::test]
async fn different_job_ids_never_collide_on_fingerprint() {
    let chapters = vec![SourceChapter { start_seconds: 0.0, end_seconds: 20.0, importance_score: 0.6 }];
    let config = blank_config(None);

    let planner_a = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters: chapters.clone() }));
    let segments_a = planner_a
        .plan(JobId::new(), 20.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    let planner_b = SegmentPlanner::new(gate(), Arc::new(StubChapterProvider { chapters }));
    let segments_b = planner_b
        .plan(JobId::new(), 20.0, "blob://local/source", &config, &SegmentConfig::default(), &PlanLimits::default(), CancellationToken::new())
        .await
        .unwrap();

    assert_ne!(segments_a[0].fingerprint, segments_b[0].fingerprint);
}
