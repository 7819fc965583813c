// [apps/controller/src/pipeline/billing_sink.rs]
/*!
 * APARATO: WEBHOOK BILLING SINK (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1)
 * RESPONSABILIDAD: ENTREGA HTTP DE LA NOTIFICACIÓN DE FACTURACIÓN
 *
 * Grounded in the neighbor's strategic-archival relay: a POST to an external
 * ledger where 2xx and 409 (already recorded) both count as success, since
 * the receiving side is assumed idempotent on `job_id`. Unlike that relay
 * this has no retry loop of its own — a failed delivery is logged and the
 * notice is dropped, because billing completion is advisory here: the
 * authoritative ledger commit already happened before this call fires.
 */

use async_trait::async_trait;
use narrata_domain_billing::{BillingCompletionNotice, BillingSink};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

pub struct WebhookBillingSink {
    http_client: Client,
    endpoint_url: String,
}

impl WebhookBillingSink {
    pub fn new(http_client: Client, endpoint_url: String) -> Self {
        Self { http_client, endpoint_url }
    }

    pub fn with_default_client(endpoint_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build billing webhook http client");
        Self::new(http_client, endpoint_url)
    }
}

#[async_trait]
impl BillingSink for WebhookBillingSink {
    async fn notify_completion(&self, notice: BillingCompletionNotice) {
        let job_id = notice.job_id;
        let response = self.http_client.post(&self.endpoint_url).json(&notice).send().await;

        match response {
            Ok(response) if response.status().is_success() || response.status() == StatusCode::CONFLICT => {}
            Ok(response) => {
                warn!(%job_id, status = %response.status(), "billing completion notice rejected");
            }
            Err(fault) => {
                warn!(%job_id, %fault, "billing completion notice delivery failed");
            }
        }
    }
}
