// [tests/mirror/libs/infra/job_store/ledger_exactly_once.test.rs]
//! El Ledger SQL debe sostener los dos invariantes de facturación del
//! sistema: `reserve` es idempotente por `jobId`, y `commit` nunca deduce
//! dos veces para el mismo `(jobId, billingPeriod)` aunque se reintente.

use narrata_domain_billing::{BillingPeriod, LedgerError, QuotaLedger};
use narrata_infra_job_store::{JobStoreClient, SqlQuotaLedger};
use uuid::Uuid;

const DEFAULT_SUBSCRIPTION_MINUTES: f64 = 60.0;

async fn ledger() -> SqlQuotaLedger {
    let client = JobStoreClient::connect(":memory:", None).await.expect("connect");
    SqlQuotaLedger::new(client, DEFAULT_SUBSCRIPTION_MINUTES)
}

#[tokio::test]
async fn reserve_is_idempotent_for_the_same_job_id() {
    let ledger = ledger().await;
    let job_id = Uuid::new_v4();

    let first = ledger.reserve("user-1", job_id, 10.0).await.expect("first reserve");
    let second = ledger.reserve("user-1", job_id, 10.0).await.expect("retried reserve");
    assert_eq!(first, second, "retrying reserve for the same job must return the same reservation");
}

#[tokio::test]
async fn reserve_rejects_a_request_beyond_available_minutes() {
    let ledger = ledger().await;
    let job_id = Uuid::new_v4();

    let outcome = ledger.reserve("user-1", job_id, DEFAULT_SUBSCRIPTION_MINUTES + 1.0).await;
    assert!(matches!(outcome, Err(LedgerError::QuotaExceeded { .. })));
}

#[tokio::test]
async fn commit_deducts_exactly_once_even_when_retried() {
    let ledger = ledger().await;
    let job_id = Uuid::new_v4();
    let billing_period = BillingPeriod::current();

    let reservation_id = ledger.reserve("user-1", job_id, 10.0).await.expect("reserve");
    ledger.commit(reservation_id, 5.0, job_id, billing_period.clone()).await.expect("first commit");
    ledger.commit(reservation_id, 5.0, job_id, billing_period).await.expect("retried commit is a no-op");

    let snapshot = ledger.get_quota_snapshot("user-1").await.expect("snapshot");
    assert_eq!(snapshot.subscription_minutes_used, 5.0, "a retried commit must not double-deduct");
}

#[tokio::test]
async fn committing_an_unknown_reservation_fails() {
    let ledger = ledger().await;
    let job_id = Uuid::new_v4();
    let outcome = ledger.commit(Uuid::new_v4(), 5.0, job_id, BillingPeriod::current()).await;
    assert!(matches!(outcome, Err(LedgerError::ReservationNotFound(_))));
}

#[tokio::test]
async fn release_is_a_safe_no_op_on_an_unknown_or_already_released_reservation() {
    let ledger = ledger().await;
    ledger.release(Uuid::new_v4()).await.expect("release on an unknown reservation is a no-op");

    let job_id = Uuid::new_v4();
    let reservation_id = ledger.reserve("user-1", job_id, 10.0).await.expect("reserve");
    ledger.release(reservation_id).await.expect("first release");
    ledger.release(reservation_id).await.expect("second release is a no-op");
}

#[tokio::test]
async fn top_up_is_idempotent_by_external_reference() {
    let ledger = ledger().await;
    ledger.top_up("user-1", 120.0, "payment-abc").await.expect("first top-up");
    ledger.top_up("user-1", 120.0, "payment-abc").await.expect("retried top-up is ignored");

    let snapshot = ledger.get_quota_snapshot("user-1").await.expect("snapshot");
    assert_eq!(snapshot.top_up_minutes_remaining, 120.0, "a retried top-up must not be credited twice");
}

#[tokio::test]
async fn commit_draws_from_top_ups_once_the_subscription_is_exhausted() {
    let ledger = ledger().await;
    let job_id = Uuid::new_v4();
    let billing_period = BillingPeriod::current();

    ledger.top_up("user-2", 120.0, "payment-xyz").await.expect("top up");
    let reservation_id = ledger.reserve("user-2", job_id, 65.0).await.expect("reserve beyond subscription alone");
    ledger.commit(reservation_id, 65.0, job_id, billing_period).await.expect("commit");

    let snapshot = ledger.get_quota_snapshot("user-2").await.expect("snapshot");
    assert_eq!(snapshot.subscription_minutes_used, DEFAULT_SUBSCRIPTION_MINUTES);
    assert_eq!(snapshot.top_up_minutes_remaining, 115.0);
}
