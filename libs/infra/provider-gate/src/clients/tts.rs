// [libs/infra/provider-gate/src/clients/tts.rs]
/*!
 * APARATO: CLIENTE DEL PROVEEDOR DE TEXTO-A-VOZ (V1.0)
 * RESPONSABILIDAD: ETAPA "SYNTHESIZE" DEL SEGMENT WORKER POOL (§4.G)
 */

use async_trait::async_trait;
use serde::Serialize;

use crate::clients::is_retriable_status;
use crate::errors::AttemptOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct SynthesizeRequest {
    pub narration_text: String,
}

#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_bytes: Vec<u8>,
    pub duration_seconds: f64,
}

#[async_trait]
pub trait TtsProvider: Send + Sync {
    async fn synthesize(&self, request: &SynthesizeRequest) -> AttemptOutcome<SynthesizedAudio>;
}

pub struct HttpTtsProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    retriable_statuses: Vec<u16>,
}

impl HttpTtsProvider {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String, voice_id: String, retriable_statuses: Vec<u16>) -> Self {
        Self { http_client, base_url, api_key, voice_id, retriable_statuses }
    }
}

#[async_trait]
impl TtsProvider for HttpTtsProvider {
    async fn synthesize(&self, request: &SynthesizeRequest) -> AttemptOutcome<SynthesizedAudio> {
        let response = match self
            .http_client
            .post(format!("{}/v1/synthesize", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("voice", self.voice_id.as_str())])
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(network_fault) => {
                return AttemptOutcome::Retriable {
                    status: None,
                    message: format!("network fault reaching TTS provider: {network_fault}"),
                }
            }
        };

        let status = response.status();
        if !status.is_success() && is_retriable_status(status, &self.retriable_statuses) {
            return AttemptOutcome::Retriable {
                status: Some(status.as_u16()),
                message: format!("TTS provider returned {status}"),
            };
        }
        if !status.is_success() {
            return AttemptOutcome::Permanent {
                message: format!("TTS provider rejected the request with {status}"),
            };
        }

        let duration_header = response
            .headers()
            .get("x-audio-duration-seconds")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<f64>().ok());

        match response.bytes().await {
            Ok(audio_bytes) => match duration_header {
                Some(duration_seconds) => AttemptOutcome::Success(SynthesizedAudio {
                    audio_bytes: audio_bytes.to_vec(),
                    duration_seconds,
                }),
                None => AttemptOutcome::Permanent {
                    message: "TTS provider did not report audio duration".to_string(),
                },
            },
            Err(transfer_fault) => AttemptOutcome::Retriable {
                status: None,
                message: format!("audio transfer interrupted: {transfer_fault}"),
            },
        }
    }
}
