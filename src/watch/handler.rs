use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::shared::{AppError, AppState};
use crate::store::models::EventModel;
use crate::ws::SocketMessage;

/// Subscription endpoint for a single event
///
/// GET /events/:id/watch - streams one event-updated frame per published
/// snapshot of the requested event. Independent of the room broadcast: a
/// client using both paths receives duplicates and applies them
/// idempotently.
pub async fn watch_handler(
    ws: WebSocketUpgrade,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_watch(socket, event_id, state))
}

async fn run_watch(mut socket: WebSocket, event_id: String, state: AppState) {
    info!(event_id = %event_id, "Watch stream opened");

    // Listener registered before the initial fetch so no snapshot can fall
    // between them
    let mut subscription = state.publisher.subscribe(&event_id).await;

    let initial = match state.attendance.get_event(&event_id).await {
        Ok(event) => event,
        Err(AppError::NotFound(msg)) => {
            let _ = send_frame(&mut socket, &SocketMessage::error(msg)).await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
        Err(e) => {
            warn!(event_id = %event_id, error = %e, "Initial fetch failed");
            let _ = send_frame(&mut socket, &SocketMessage::error(e.to_string())).await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let mut last_seen = initial.updated_at;
    if send_snapshot(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            snapshot = subscription.recv() => {
                match snapshot {
                    Some(snapshot) => {
                        // The initial fetch may already reflect snapshots
                        // buffered before it completed; never send an older
                        // state after a newer one
                        if !supersedes(&snapshot.updated_at, &last_seen) {
                            debug!(event_id = %event_id, "Skipping superseded snapshot");
                            continue;
                        }
                        last_seen = snapshot.updated_at;
                        if send_snapshot(&mut socket, &snapshot).await.is_err() {
                            break;
                        }
                    }
                    None => break, // Topic torn down
                }
            }

            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(event_id = %event_id, error = %e, "Watch stream receive error");
                        break;
                    }
                    // Inbound text/ping frames carry nothing for this channel
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Dropping the subscription releases the publisher listener right here,
    // synchronously with the stream ending
    info!(event_id = %event_id, "Watch stream closed");
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &EventModel) -> Result<(), ()> {
    let message = SocketMessage::event_updated(snapshot).map_err(|e| {
        warn!(event_id = %snapshot.id, error = %e, "Failed to encode snapshot");
    })?;
    send_frame(socket, &message).await
}

async fn send_frame(socket: &mut WebSocket, message: &SocketMessage) -> Result<(), ()> {
    let text = serde_json::to_string(message).map_err(|_| ())?;
    socket.send(Message::Text(text)).await.map_err(|e| {
        debug!(error = %e, "Watch stream send failed - client gone");
    })
}

/// A snapshot is forwarded only if strictly newer than the last one sent
pub fn supersedes(candidate: &DateTime<Utc>, last_seen: &DateTime<Utc>) -> bool {
    candidate > last_seen
}
