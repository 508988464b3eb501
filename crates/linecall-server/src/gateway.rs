//! Per-connection websocket handler.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a writer task draining the player's event channel into
//! the socket. The reader half decodes intents and routes them through
//! the registry; room actors push events back through the channel, so
//! broadcast fan-out never blocks on a slow socket.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use linecall_protocol::{ClientIntent, Codec, JsonCodec, PlayerId, RoomCode, ServerEvent};
use linecall_room::RoomError;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::server::ServerState;
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let player_id = state.next_player_id();
    tracing::debug!(%player_id, "connection accepted");

    let (mut sink, mut reader) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let codec = JsonCodec;

    // Writer task: the only place this socket is written to.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(%err, "event encode failed");
                    continue;
                }
            };
            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(%err, "event not utf-8");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &tx, player_id, text.as_bytes()).await;
            }
            Ok(Message::Binary(data)) => {
                handle_frame(&state, &tx, player_id, &data).await;
            }
            Ok(Message::Close(_)) => break,
            // Pings are answered by the websocket layer.
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(%player_id, error = %err, "recv error");
                break;
            }
        }
    }

    // Disconnect is a leave: the room rotates the turn away and the
    // registry drops the player's index entry.
    match state.registry.leave_room(player_id).await {
        Ok(room_id) => {
            tracing::info!(%player_id, %room_id, "disconnected, left room")
        }
        Err(RoomError::NotInRoom(_)) => {}
        Err(err) => tracing::debug!(%player_id, %err, "leave on disconnect failed"),
    }

    drop(tx);
    let _ = writer.await;
    Ok(())
}

/// Decodes and dispatches one inbound frame. All failures are reported
/// to this player only; nothing here can touch another connection.
async fn handle_frame(
    state: &Arc<ServerState>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    player_id: PlayerId,
    data: &[u8],
) {
    let intent: ClientIntent = match JsonCodec.decode(data) {
        Ok(intent) => intent,
        Err(err) => {
            tracing::debug!(%player_id, %err, "undecodable frame");
            send_error(tx, "Invalid message format");
            return;
        }
    };

    match intent {
        ClientIntent::CreateRoom { room_id, username } => {
            let Some(code) = parse_code(tx, &room_id) else { return };
            let username = display_name(username, player_id);
            let result = state
                .registry
                .create_room(code, player_id, username, tx.clone())
                .await;
            if let Err(err) = result {
                send_error(tx, &err.to_string());
            }
        }
        ClientIntent::JoinRoom { room_id, username } => {
            let Some(code) = parse_code(tx, &room_id) else { return };
            let username = display_name(username, player_id);
            let result = state
                .registry
                .join_room(code, player_id, username, tx.clone())
                .await;
            if let Err(err) = result {
                send_error(tx, &err.to_string());
            }
        }
        ClientIntent::CheckRoom { room_id } => {
            let Some(code) = parse_code(tx, &room_id) else { return };
            let exists = state.registry.check_room(&code);
            let _ = tx.send(ServerEvent::RoomCheckResult {
                exists,
                room_id: code,
            });
        }
        ClientIntent::StartGame { room_id } => {
            let Some(code) = parse_code(tx, &room_id) else { return };
            let result = state.registry.start_game(player_id, &code).await;
            if let Err(err) = result {
                send_error(tx, &err.to_string());
            }
        }
        ClientIntent::MarkCell { room_id, row, col } => {
            let Some(code) = parse_code(tx, &room_id) else { return };
            let result = state
                .registry
                .mark_cell(player_id, &code, row, col)
                .await;
            if let Err(err) = result {
                send_error(tx, &err.to_string());
            }
        }
        ClientIntent::LeaveRoom { .. } => {
            if let Err(err) = state.registry.leave_room(player_id).await {
                send_error(tx, &err.to_string());
            }
        }
    }
}

fn parse_code(tx: &mpsc::UnboundedSender<ServerEvent>, raw: &str) -> Option<RoomCode> {
    match RoomCode::new(raw) {
        Ok(code) => Some(code),
        Err(err) => {
            send_error(tx, &err.to_string());
            None
        }
    }
}

/// Fills in a display name when the client sent none.
fn display_name(username: Option<String>, player_id: PlayerId) -> String {
    match username {
        Some(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => format!("Player {}", player_id.0),
    }
}

fn send_error(tx: &mpsc::UnboundedSender<ServerEvent>, message: &str) {
    let _ = tx.send(ServerEvent::Error {
        message: message.to_owned(),
    });
}
