// [libs/infra/blob-store/src/traits.rs]
use crate::errors::BlobStoreError;
use async_trait::async_trait;
use narrata_domain_models::BlobHandle;
use std::time::Duration;

/// Puerta de entrada al almacenamiento de objetos binarios: medio fuente
/// subido por el cliente y recaps ya ensamblados por el Stitcher. Los
/// handles son cadenas opacas sin estructura garantizada fuera de este
/// crate; ningún llamador debe interpretar su contenido.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Sube `bytes` bajo un nuevo handle y devuelve ese handle.
    async fn put_object(
        &self,
        key_hint: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobHandle, BlobStoreError>;

    /// Descarga el objeto completo identificado por `handle`.
    async fn get_object(&self, handle: &BlobHandle) -> Result<Vec<u8>, BlobStoreError>;

    /// Genera una URL de descarga temporal para `handle`, válida por `ttl`.
    /// La URL nunca se persiste; se genera bajo demanda en cada llamada.
    async fn presign_get(&self, handle: &BlobHandle, ttl: Duration) -> Result<String, BlobStoreError>;

    /// Elimina el objeto. Idempotente: borrar un handle inexistente no es un error.
    async fn delete(&self, handle: &BlobHandle) -> Result<(), BlobStoreError>;
}
