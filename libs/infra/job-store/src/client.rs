// [libs/infra/job-store/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID DEL JOB STORE
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y ancla una conexión viva ANTES de
 * la ejecución del bootstrap, asegurando que las tablas residan en un
 * segmento de memoria compartido en lugar de purgarse entre conexiones.
 * =================================================================
 */

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{error, info, instrument};

use crate::errors::DbError;
use crate::schema::apply_full_sovereign_schema;

#[derive(Clone)]
pub struct JobStoreClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl JobStoreClient {
    #[instrument(skip(database_access_token))]
    pub async fn connect(database_connection_url: &str, database_access_token: Option<String>) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        info!("🔌 [JOB_STORE]: Initiating tactical link synchronization to [{}]", database_connection_url);

        let is_remote = database_connection_url.starts_with("libsql://") || database_connection_url.starts_with("https://");
        let is_memory = database_connection_url.contains(":memory:") || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token
                .ok_or_else(|| DbError::ConfigurationError("remote job store requires an access token".into()))?;
            Builder::new_remote(database_connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|fault| DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {fault}")))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            let anchor_connection = shared_driver
                .connect()
                .map_err(|fault| DbError::ConnectionError(format!("ANCHOR_FAULT: {fault}")))?;
            apply_full_sovereign_schema(&anchor_connection).await?;
            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [JOB_STORE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|fault| DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {fault}")))?;
            apply_full_sovereign_schema(&bootstrap_connection).await?;
        }

        Ok(Self { internal_database_driver: shared_driver, _memory_persistence_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.internal_database_driver.connect().map_err(|fault| {
            error!("⚠️ [JOB_STORE_POOL_FAULT]: Connection allocation failed: {}", fault);
            DbError::ConnectionError(fault.to_string())
        })
    }
}
