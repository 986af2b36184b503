//! WebSocket handler for the supervisor dashboard topic.
//!
//! The socket is one-directional in practice: the hub pushes refresh notices
//! out, and whatever the client sends is read and dropped so an unexpected
//! frame never tears the connection down.

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use util::{state::AppState, ws::dashboard_topic};

use crate::auth::verify_jwt;

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: Option<String>,
}

/// GET /ws/dashboard?token=<jwt>
///
/// Supervisor-only. Validates the token before upgrading, then subscribes
/// the socket to the dashboard topic and forwards hub messages until the
/// client goes away.
pub async fn dashboard_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsAuthQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(token) = query.token else {
        return (StatusCode::UNAUTHORIZED, "Missing token").into_response();
    };
    let claims = match verify_jwt(&token) {
        Ok(claims) => claims,
        Err(_) => return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response(),
    };
    if !claims.supervisor {
        return (StatusCode::FORBIDDEN, "only a supervisor may view this").into_response();
    }

    let user_id = claims.sub;
    ws.on_upgrade(move |socket| handle_dashboard_socket(socket, state, user_id))
}

async fn handle_dashboard_socket(socket: WebSocket, state: AppState, user_id: i64) {
    let topic = dashboard_topic();
    let mut rx = state.ws().subscribe(&topic).await;
    let (mut sink, mut stream) = socket.split();

    tracing::info!(user_id, topic = %topic, "Dashboard observer connected");

    // Hub → client: forward every broadcast on the topic.
    let forward_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if sink.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Client → server: drain and ignore until the socket closes. Unrecognized
    // payloads are not an error.
    while let Some(Ok(msg)) = stream.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    forward_task.abort();
    tracing::info!(user_id, topic = %topic, "Dashboard observer disconnected");
}
