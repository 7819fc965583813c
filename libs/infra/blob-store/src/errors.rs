// [libs/infra/blob-store/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("[L3_BLOB_NOT_FOUND]: no object exists for handle '{0}'")]
    NotFound(String),

    #[error("[L3_BLOB_IO_FAULT]: local filesystem operation failed for handle '{handle}': {source}")]
    IoFault {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[L3_BLOB_NETWORK_FAULT]: remote object store request failed: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("[L3_BLOB_SERVER_REJECTION]: remote object store rejected the request with status {0}")]
    ServerRejection(u16),

    #[error("[L3_BLOB_INVALID_HANDLE]: handle '{0}' is not well-formed for this backend")]
    InvalidHandle(String),
}

impl BlobStoreError {
    pub fn to_error_kind(&self) -> narrata_domain_models::ErrorKind {
        match self {
            BlobStoreError::NotFound(_) | BlobStoreError::InvalidHandle(_) => {
                narrata_domain_models::ErrorKind::InvalidInput
            }
            BlobStoreError::IoFault { .. }
            | BlobStoreError::NetworkFault(_)
            | BlobStoreError::ServerRejection(_) => narrata_domain_models::ErrorKind::ProviderTransient,
        }
    }
}
