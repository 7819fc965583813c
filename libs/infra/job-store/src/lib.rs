// [libs/infra/job-store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: JOB STORE Y QUOTA LEDGER SOBRE LIBSQL (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: BARRIL PÚBLICO DEL ADAPTADOR DE PERSISTENCIA (MOTOR A)
 *
 * Job Store y Quota Ledger comparten la misma conexión libSQL (ver
 * `schema.rs`) pero se exponen como dos superficies separadas: el Job Store
 * a través de `JobRepository`/`SegmentRepository`/`ProgressRingRepository`,
 * el Ledger a través de `SqlQuotaLedger`, que implementa el trait
 * `QuotaLedger` de narrata-domain-billing y no expone ninguna tabla SQL a
 * sus llamadores.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod ports;
pub mod repositories;
pub mod schema;

pub use client::JobStoreClient;
pub use errors::DbError;
pub use ports::{JobStore, SegmentStore};
pub use repositories::{JobRepository, ProgressRingRepository, SegmentRepository, SqlQuotaLedger};
