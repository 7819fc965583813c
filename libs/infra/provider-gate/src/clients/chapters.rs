// [libs/infra/provider-gate/src/clients/chapters.rs]
/*!
 * APARATO: CLIENTE DEL SERVICIO DE CAPÍTULOS (V1.0)
 * RESPONSABILIDAD: ENTRADA DEL SEGMENT PLANNER CUANDO NO HAY GUION (§4.F.2)
 */

use async_trait::async_trait;
use serde::Deserialize;

use crate::clients::is_retriable_status;
use crate::errors::AttemptOutcome;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceChapter {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub importance_score: f64,
}

#[async_trait]
pub trait ChapterProvider: Send + Sync {
    async fn coarse_chapters(&self, source_blob_url: &str) -> AttemptOutcome<Vec<SourceChapter>>;
}

pub struct HttpChapterProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retriable_statuses: Vec<u16>,
}

impl HttpChapterProvider {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String, retriable_statuses: Vec<u16>) -> Self {
        Self { http_client, base_url, api_key, retriable_statuses }
    }
}

#[async_trait]
impl ChapterProvider for HttpChapterProvider {
    async fn coarse_chapters(&self, source_blob_url: &str) -> AttemptOutcome<Vec<SourceChapter>> {
        let response = match self
            .http_client
            .get(format!("{}/v1/chapters", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("source", source_blob_url)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(network_fault) => {
                return AttemptOutcome::Retriable {
                    status: None,
                    message: format!("network fault reaching chapter service: {network_fault}"),
                }
            }
        };

        let status = response.status();
        if !status.is_success() && is_retriable_status(status, &self.retriable_statuses) {
            return AttemptOutcome::Retriable {
                status: Some(status.as_u16()),
                message: format!("chapter service returned {status}"),
            };
        }
        if !status.is_success() {
            return AttemptOutcome::Permanent {
                message: format!("chapter service rejected the request with {status}"),
            };
        }

        match response.json::<Vec<SourceChapter>>().await {
            Ok(chapters) => AttemptOutcome::Success(chapters),
            Err(decode_fault) => AttemptOutcome::Permanent {
                message: format!("malformed chapter service response: {decode_fault}"),
            },
        }
    }
}
