//! Realtime change feed over WebSocket.
//!
//! The bearer token arrives as a `?token=` query parameter because the
//! WebSocket handshake has no usable Authorization header channel. It is
//! validated once at admission and its expiry is re-checked for the life of
//! the connection: before every forwarded event and on a periodic tick, so
//! an idle socket does not outlive its token.
//!
//! Delivery is best-effort. A listener that falls behind the broadcast
//! buffer loses its oldest backlog and is told so with a `lagged` frame;
//! the authoritative state is always re-fetchable through the read API.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{FromRequestParts, Query, State, WebSocketUpgrade};
use axum::http::request::Parts;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};
use tresorerie_core::events::ChangeEvent;
use tresorerie_shared::Claims;

use crate::error::ApiError;
use crate::AppState;

/// How often an otherwise idle connection re-checks token expiry.
const EXPIRY_TICK: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ConnectQuery {
    token: Option<String>,
}

/// Creates the realtime feed route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(connect))
}

/// Claims admitted through the `?token=` parameter. Extracted before the
/// upgrade itself, so a bad token answers 401 instead of completing the
/// handshake and closing.
struct AdmittedClaims(Claims);

impl FromRequestParts<AppState> for AdmittedClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ConnectQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let token = query
            .token
            .ok_or_else(|| ApiError::unauthorized("missing token query parameter"))?;
        Ok(Self(state.jwt.validate_token(&token)?))
    }
}

/// GET /events - Admit the connection if the token verifies, then forward
/// every change event as one text frame.
async fn connect(
    State(state): State<AppState>,
    AdmittedClaims(claims): AdmittedClaims,
    ws: WebSocketUpgrade,
) -> Response {
    let rx = state.events.subscribe();
    info!(user_id = %claims.user_id(), "realtime listener connected");
    ws.on_upgrade(move |socket| forward_events(socket, rx, claims))
}

async fn forward_events(socket: WebSocket, mut rx: Receiver<ChangeEvent>, claims: Claims) {
    let (mut sink, mut stream) = socket.split();
    let mut tick = tokio::time::interval(EXPIRY_TICK);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = rx.recv() => {
                if claims.is_expired_at(Utc::now()) {
                    break;
                }
                match event {
                    Ok(event) => {
                        if sink.send(Message::Text(event.to_frame().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!(user_id = %claims.user_id(), missed, "listener lagged");
                        let notice = format!("{{\"event\":\"lagged\",\"data\":{{\"missed\":{missed}}}}}");
                        if sink.send(Message::Text(notice.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tick.tick() => {
                if claims.is_expired_at(Utc::now()) {
                    break;
                }
            }
            incoming = stream.next() => {
                // Clients only ever close or ping; anything else is ignored.
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    info!(user_id = %claims.user_id(), "realtime listener disconnected");
    let _ = sink.send(Message::Close(None)).await;
}
