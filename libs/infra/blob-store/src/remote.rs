// [libs/infra/blob-store/src/remote.rs]
/*!
 * APARATO: REMOTE BLOB STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE OBJETOS CONTRA UN OBJECT STORE HTTP EXTERNO
 *
 * Backend de producción: delega put/get/delete a un servicio de objetos
 * detrás de un único endpoint base, sobre el mismo cliente `reqwest` que el
 * resto del stack usa para hablar con proveedores externos.
 */

use crate::errors::BlobStoreError;
use crate::traits::BlobStore;
use async_trait::async_trait;
use narrata_domain_models::BlobHandle;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

pub struct RemoteBlobStore {
    http_client: Client,
    base_endpoint: String,
}

impl RemoteBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("FATAL: remote blob store client initialization failed."),
            base_endpoint: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, object_key: &str) -> String {
        format!("{}/objects/{}", self.base_endpoint, object_key)
    }

    fn object_key(&self, handle: &BlobHandle) -> Result<String, BlobStoreError> {
        handle
            .0
            .strip_prefix("blob://remote/")
            .map(str::to_string)
            .ok_or_else(|| BlobStoreError::InvalidHandle(handle.0.clone()))
    }
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    #[instrument(skip(self, bytes))]
    async fn put_object(
        &self,
        key_hint: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobHandle, BlobStoreError> {
        let object_key = format!("{}-{}", Uuid::new_v4(), key_hint);
        let response = self
            .http_client
            .put(self.object_url(&object_key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(BlobHandle(format!("blob://remote/{}", object_key)))
        } else {
            Err(BlobStoreError::ServerRejection(response.status().as_u16()))
        }
    }

    #[instrument(skip(self))]
    async fn get_object(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobStoreError> {
        let object_key = self.object_key(handle)?;
        let response = self.http_client.get(self.object_url(&object_key)).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound(handle.0.clone())),
            status => Err(BlobStoreError::ServerRejection(status.as_u16())),
        }
    }

    #[instrument(skip(self))]
    async fn presign_get(&self, handle: &BlobHandle, ttl: Duration) -> Result<String, BlobStoreError> {
        let object_key = self.object_key(handle)?;
        let response = self
            .http_client
            .post(format!("{}/presign", self.base_endpoint))
            .json(&serde_json::json!({ "objectKey": object_key, "ttlSeconds": ttl.as_secs() }))
            .send()
            .await?;

        if response.status().is_success() {
            let body: serde_json::Value = response.json().await?;
            body.get("url")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| BlobStoreError::ServerRejection(502))
        } else {
            Err(BlobStoreError::ServerRejection(response.status().as_u16()))
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, handle: &BlobHandle) -> Result<(), BlobStoreError> {
        let object_key = self.object_key(handle)?;
        let response = self.http_client.delete(self.object_url(&object_key)).send().await?;

        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => Err(BlobStoreError::ServerRejection(status.as_u16())),
        }
    }
}
