// [libs/infra/blob-store/src/local.rs]
/*!
 * =================================================================
 * APARATO: LOCAL BLOB STORE (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE OBJETOS SOBRE EL SISTEMA DE ARCHIVOS LOCAL
 *
 * Backend de desarrollo y de pruebas: cada objeto es un archivo bajo
 * `root_dir`, nombrado por un UUID para que dos `put_object` nunca colisionen
 * incluso con el mismo `key_hint`.
 * =================================================================
 */

use crate::errors::BlobStoreError;
use crate::traits::BlobStore;
use async_trait::async_trait;
use narrata_domain_models::BlobHandle;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct LocalBlobStore {
    root_dir: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(root_dir: impl Into<PathBuf>) -> Result<Self, BlobStoreError> {
        let root_dir = root_dir.into();
        fs::create_dir_all(&root_dir)
            .await
            .map_err(|source| BlobStoreError::IoFault {
                handle: root_dir.display().to_string(),
                source,
            })?;
        Ok(Self { root_dir })
    }

    fn object_path(&self, handle: &BlobHandle) -> Result<PathBuf, BlobStoreError> {
        let file_name = handle
            .0
            .strip_prefix("blob://local/")
            .ok_or_else(|| BlobStoreError::InvalidHandle(handle.0.clone()))?;
        Ok(self.root_dir.join(file_name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes))]
    async fn put_object(
        &self,
        key_hint: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<BlobHandle, BlobStoreError> {
        let sanitized_hint: String = key_hint
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let file_name = format!("{}_{}", Uuid::new_v4(), sanitized_hint);
        let destination: &Path = &self.root_dir.join(&file_name);

        fs::write(destination, &bytes)
            .await
            .map_err(|source| BlobStoreError::IoFault {
                handle: file_name.clone(),
                source,
            })?;

        info!("blob written: {} ({} bytes)", file_name, bytes.len());
        Ok(BlobHandle(format!("blob://local/{}", file_name)))
    }

    #[instrument(skip(self))]
    async fn get_object(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.object_path(handle)?;
        fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                BlobStoreError::NotFound(handle.0.clone())
            } else {
                BlobStoreError::IoFault {
                    handle: handle.0.clone(),
                    source,
                }
            }
        })
    }

    #[instrument(skip(self))]
    async fn presign_get(&self, handle: &BlobHandle, ttl: Duration) -> Result<String, BlobStoreError> {
        let path = self.object_path(handle)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BlobStoreError::NotFound(handle.0.clone()));
        }
        let expires_at = chrono::Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default();
        Ok(format!("file://{}?expires={}", path.display(), expires_at.to_rfc3339()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, handle: &BlobHandle) -> Result<(), BlobStoreError> {
        let path = self.object_path(handle)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BlobStoreError::IoFault {
                handle: handle.0.clone(),
                source,
            }),
        }
    }
}
