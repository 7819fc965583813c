// [apps/controller/src/main.rs]
/*!
 * APARATO: CONTROLLER MAIN ENTRY POINT (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL KERNEL
 */

use narrata_controller::prelude::*;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use narrata_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<()> {
    dotenv().ok();
    init_tracing("narrata_controller");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()
        .context("failed to build the tokio runtime")?;

    runtime.block_on(async {
        let database_connection_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let listening_port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let kernel = ControllerKernel::ignite(&database_connection_url, database_access_token, listening_port).await;

        info!(port = listening_port, "controller online");
        kernel.launch().await;

        Ok(())
    })
}
