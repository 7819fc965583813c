// [libs/infra/provider-gate/src/clients/vision.rs]
/*!
 * APARATO: CLIENTE DEL PROVEEDOR DE COMPRENSIÓN VISUAL (V1.0)
 * RESPONSABILIDAD: ETAPA "DESCRIBE" DEL SEGMENT WORKER POOL (§4.G)
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clients::is_retriable_status;
use crate::errors::AttemptOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct DescribeSegmentRequest {
    pub source_blob_url: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Límite de palabras sugerido para la narración resultante; el
    /// proveedor puede excederlo, el llamador recorta si es necesario.
    pub target_words: Option<u32>,
    pub character_guide_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescribedSegment {
    pub narration_text: String,
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn describe(&self, request: &DescribeSegmentRequest) -> AttemptOutcome<DescribedSegment>;
}

/// Adaptador HTTP sobre `reqwest`; la URL base y el token de autenticación se
/// inyectan al construirlo. Los detalles del prompt/modelo usado del otro
/// lado permanecen opacos aquí, como exige §1.
pub struct HttpVisionProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Mirrors the provider's `ProviderConfig.retriable_statuses` (§4.C); the
    /// Gate owns the retry loop, this just classifies each HTTP response.
    retriable_statuses: Vec<u16>,
}

impl HttpVisionProvider {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String, retriable_statuses: Vec<u16>) -> Self {
        Self { http_client, base_url, api_key, retriable_statuses }
    }
}

#[async_trait]
impl VisionProvider for HttpVisionProvider {
    async fn describe(&self, request: &DescribeSegmentRequest) -> AttemptOutcome<DescribedSegment> {
        let response = match self
            .http_client
            .post(format!("{}/v1/describe", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(network_fault) => {
                return AttemptOutcome::Retriable {
                    status: None,
                    message: format!("network fault reaching vision provider: {network_fault}"),
                }
            }
        };

        let status = response.status();
        if !status.is_success() && is_retriable_status(status, &self.retriable_statuses) {
            return AttemptOutcome::Retriable {
                status: Some(status.as_u16()),
                message: format!("vision provider returned {status}"),
            };
        }
        if !status.is_success() {
            return AttemptOutcome::Permanent {
                message: format!("vision provider rejected the request with {status}"),
            };
        }

        match response.json::<DescribedSegment>().await {
            Ok(described) => {
                let mut described = described;
                if let Some(target_words) = request.target_words {
                    described.narration_text = clamp_to_word_count(&described.narration_text, target_words);
                }
                AttemptOutcome::Success(described)
            }
            Err(decode_fault) => AttemptOutcome::Permanent {
                message: format!("malformed vision provider response: {decode_fault}"),
            },
        }
    }
}

fn clamp_to_word_count(text: &str, target_words: u32) -> String {
    text.split_whitespace()
        .take(target_words as usize)
        .collect::<Vec<_>>()
        .join(" ")
}
