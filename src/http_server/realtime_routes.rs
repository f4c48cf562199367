//! Realtime HTTP Routes and WebSocket Handler
//!
//! - `GET  /ws?channel=C&sender=S`: join stream (WebSocket)
//! - `POST /messages`: send one chat message, get one ack
//! - `GET  /stats`: clock value and channel sizes
//! - `GET  /members?channel=C`: member names of a channel

use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::clock::Timestamp;
use crate::observability::Event;
use crate::realtime::{
    Ack, ChatEvent, ChatService, DispatcherStats, JoinedSession, RealtimeError, SendMessage, Session,
};

// ==================
// Shared State
// ==================

/// Realtime state shared across handlers
pub struct RealtimeState {
    pub service: ChatService,
}

impl RealtimeState {
    pub fn new(service: ChatService) -> Self {
        Self { service }
    }
}

// ==================
// Request/Response Types
// ==================

/// Query string of the join stream
#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub channel: String,
    pub sender: String,
}

#[derive(Debug, Deserialize)]
pub struct MembersParams {
    pub channel: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembersResponse {
    pub channel: String,
    pub members: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Frame sent by a joined client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Chat message with the greatest timestamp the client has observed
    Send {
        text: String,
        #[serde(default)]
        timestamp: Timestamp,
    },
    /// Explicit leave; the server closes the stream afterwards
    Leave,
}

/// Frame sent to a joined client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A dispatched channel event
    Event(Arc<ChatEvent>),
    /// Acknowledgement of this client's own send
    Ack(Ack),
    /// Request failed
    Error { message: String, code: u16 },
}

impl ServerFrame {
    fn error(err: &RealtimeError) -> Self {
        ServerFrame::Error {
            message: err.to_string(),
            code: err.close_code(),
        }
    }
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(err: RealtimeError) -> ErrorReply {
    let status = if err.is_fatal() {
        error!(event = %Event::InvariantViolation, error = %err, "request failed on broken invariant");
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        debug!(event = %Event::MessageRejected, error = %err, "request refused");
        StatusCode::BAD_REQUEST
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.close_code(),
        }),
    )
}

// ==================
// Realtime Routes
// ==================

/// Create realtime routes with WebSocket support
pub fn realtime_routes(state: Arc<RealtimeState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/messages", post(send_message_handler))
        .route("/stats", get(get_stats_handler))
        .route("/members", get(members_handler))
        .with_state(state)
}

// ==================
// WebSocket Handler
// ==================

/// Handle WebSocket upgrade request
async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(state): State<Arc<RealtimeState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state, params))
}

type WsSink = SplitSink<WebSocket, Message>;

async fn send_frame(sink: &mut WsSink, frame: &ServerFrame) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize frame");
            Ok(())
        }
    }
}

/// Handle one joined client until either side closes.
///
/// The loop waits on inbound frames and on the session's event stream. The
/// inbound side is polled first so a close is seen before another event is
/// forwarded. Whatever ends the loop, the session leaves exactly once.
async fn handle_websocket(socket: WebSocket, state: Arc<RealtimeState>, params: JoinParams) {
    let (mut sink, mut stream) = socket.split();

    let JoinedSession { session, mut events } =
        match state.service.join_channel(&params.channel, &params.sender) {
            Ok(joined) => joined,
            Err(e) => {
                debug!(channel = %params.channel, sender = %params.sender, error = %e, "join refused");
                let _ = send_frame(&mut sink, &ServerFrame::error(&e)).await;
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: e.close_code(),
                        reason: e.to_string().into(),
                    })))
                    .await;
                return;
            }
        };

    loop {
        tokio::select! {
            biased;

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(ClientFrame::Send { text, timestamp }) => send_from_session(&session, text, timestamp),
                        Ok(ClientFrame::Leave) => break,
                        Err(e) => ServerFrame::error(&RealtimeError::InvalidMessage(e.to_string())),
                    };
                    if send_frame(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(
                        event = %Event::SessionTransportError,
                        session_id = %session.id(),
                        error = %e,
                        "read failed"
                    );
                    break;
                }
            },

            delivered = events.recv() => match delivered {
                Some(event) => {
                    if send_frame(&mut sink, &ServerFrame::Event(event)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    if let Err(e) = session.leave() {
        error!(session_id = %session.id(), error = %e, "leave failed");
    }
    let _ = sink.close().await;
}

fn send_from_session(session: &Session, text: String, timestamp: Timestamp) -> ServerFrame {
    match session.send(text, timestamp) {
        Ok(ack) => ServerFrame::Ack(ack),
        Err(e) => {
            if e.is_fatal() {
                error!(event = %Event::InvariantViolation, session_id = %session.id(), error = %e, "send failed");
            }
            ServerFrame::error(&e)
        }
    }
}

// ==================
// HTTP Handlers
// ==================

/// Send one chat message
async fn send_message_handler(
    State(state): State<Arc<RealtimeState>>,
    Json(request): Json<SendMessage>,
) -> Result<Json<Ack>, ErrorReply> {
    state.service.send_message(request).map(Json).map_err(error_reply)
}

/// Get realtime statistics
async fn get_stats_handler(
    State(state): State<Arc<RealtimeState>>,
) -> Result<Json<DispatcherStats>, ErrorReply> {
    state.service.stats().map(Json).map_err(error_reply)
}

/// List members of one channel
async fn members_handler(
    State(state): State<Arc<RealtimeState>>,
    Query(params): Query<MembersParams>,
) -> Result<Json<MembersResponse>, ErrorReply> {
    let members = state
        .service
        .dispatcher()
        .members(&params.channel)
        .map_err(error_reply)?;

    Ok(Json(MembersResponse {
        channel: params.channel,
        members,
    }))
}
