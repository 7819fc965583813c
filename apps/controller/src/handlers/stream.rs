// [apps/controller/src/handlers/stream.rs]
/*!
 * APARATO: LIVE SUBSCRIPTION SOCKET (V1.0)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: GET /api/v1/jobs/:jobId/stream (WebSocket)
 *
 * Simplificación del enlace de doble tarea del vecino: no existe un
 * concepto de "comando" entrante en esta superficie, así que la tarea de
 * trabajador interno desaparece. Quedan dos tareas unidas por
 * `tokio::select!` — downstream (snapshot, backlog, eventos en vivo, Ping
 * de keepalive) y upstream (sólo para detectar el cierre del cliente) — la
 * primera en terminar aborta la otra.
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tokio::time::{interval, Duration};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::pipeline::envelope_for_event;
use crate::state::AppState;
use narrata_domain_models::JobId;

const KEEPALIVE_INTERVAL_SECONDS: u64 = 25;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    #[serde(rename = "lastSeenSequence")]
    pub last_seen_sequence: Option<u64>,
}

pub async fn stream_job_progress(
    websocket_upgrade: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    websocket_upgrade.on_upgrade(move |socket| run_subscription(socket, state, JobId(job_id), query.last_seen_sequence))
}

#[instrument(skip(socket, state))]
async fn run_subscription(socket: WebSocket, state: AppState, job_id: JobId, last_seen_sequence: Option<u64>) {
    let subscription = match state.progress_bus.subscribe(job_id, last_seen_sequence).await {
        Ok(subscription) => subscription,
        Err(fault) => {
            warn!(%job_id, %fault, "could not open subscription");
            return;
        }
    };

    let (mut socket_sender, mut socket_receiver) = {
        use futures_util::StreamExt;
        socket.split()
    };

    let mut downstream_task = tokio::spawn(async move {
        use futures_util::SinkExt;

        if last_seen_sequence.is_none() {
            let envelope = narrata_domain_models::SubscriptionEnvelope::Initial { snapshot: subscription.snapshot.clone() };
            if send_envelope(&mut socket_sender, &envelope).await.is_err() {
                return;
            }
        }

        for event in subscription.backlog {
            let is_terminal = event.stage.is_terminal();
            let envelope = envelope_for_event(event);
            if send_envelope(&mut socket_sender, &envelope).await.is_err() {
                return;
            }
            if is_terminal {
                return;
            }
        }

        let mut live = subscription.live;
        let mut keepalive_timer = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS));

        loop {
            tokio::select! {
                _ = keepalive_timer.tick() => {
                    if socket_sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
                received = live.recv() => {
                    match received {
                        Ok(event) => {
                            let is_terminal = event.stage.is_terminal();
                            let envelope = envelope_for_event(event);
                            if send_envelope(&mut socket_sender, &envelope).await.is_err() {
                                break;
                            }
                            if is_terminal {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "subscriber lagged behind the live progress channel");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    });

    let mut upstream_task = tokio::spawn(async move {
        use futures_util::StreamExt;
        while let Some(frame) = socket_receiver.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    tokio::select! {
        _ = &mut downstream_task => upstream_task.abort(),
        _ = &mut upstream_task => downstream_task.abort(),
    }
}

async fn send_envelope(
    sender: &mut (impl futures_util::Sink<Message, Error = axum::Error> + Unpin),
    envelope: &narrata_domain_models::SubscriptionEnvelope,
) -> Result<(), axum::Error> {
    use futures_util::SinkExt;
    let payload = serde_json::to_string(envelope).expect("subscription envelope always serializes");
    sender.send(Message::Text(payload)).await
}
