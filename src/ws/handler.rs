//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::entities::HIT_FLASH_DURATION_MS;
use crate::game::{GameMatch, MatchHandle};
use crate::util::rate_limit::ClientRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("WebSocket send failed: {0}")]
    Send(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection: one connection, one match
async fn handle_socket(socket: WebSocket, state: AppState) {
    let seed = state.config.match_seed.unwrap_or_else(rand::random);
    let (game_match, handle) = GameMatch::new(
        state.config.sim_config(),
        seed,
        state.config.tick_settings(),
    );
    let match_id = handle.id;

    info!(match_id = %match_id, seed, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // Subscribe before the match task starts so no snapshot is missed
    let snapshot_rx = handle.snapshot_tx.subscribe();
    state.match_registry.insert(handle.clone());
    let match_task = tokio::spawn(game_match.run());

    let welcome = ServerMsg::Welcome {
        match_id,
        server_time: unix_millis(),
        tick_rate: state.config.tick_rate,
        hit_flash_ms: HIT_FLASH_DURATION_MS,
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(match_id = %match_id, error = %e, "Failed to send welcome");
    } else {
        run_session(match_id, ws_sink, ws_stream, &handle, snapshot_rx).await;
    }

    // Cleanup on disconnect
    let _ = handle.input_tx.send(ClientMsg::Leave).await;
    if let Err(e) = match_task.await {
        error!(match_id = %match_id, error = %e, "Match task failed");
    }
    state.match_registry.remove(&match_id);

    info!(match_id = %match_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    match_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    handle: &MatchHandle,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    // Errors travel the same channel as snapshots so they stay ordered
    let reply_error = |code: &str, message: String| {
        let _ = handle.snapshot_tx.send(ServerMsg::Error {
            code: code.to_string(),
            message,
        });
    };

    let rate_limiter = ClientRateLimiter::new();

    // Spawn writer task: match broadcasts -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(match_id = %match_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        match_id = %match_id,
                        lagged_count = n,
                        "Client lagged, skipping {} snapshots", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(match_id = %match_id, "Snapshot channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> match loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(match_id = %match_id, "Rate limited client message");
                    reply_error("rate_limited", "Too many messages".to_string());
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Leave) => break,
                    Ok(client_msg) => {
                        if handle.input_tx.send(client_msg).await.is_err() {
                            debug!(match_id = %match_id, "Input channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(match_id = %match_id, error = %e, "Failed to parse client message");
                        reply_error("bad_message", e.to_string());
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(match_id = %match_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(match_id = %match_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(match_id = %match_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
