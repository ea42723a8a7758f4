use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Extension, Router,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{models::users::CurrentUser, AppState};

pub fn notifications_handler() -> Router {
    Router::new().route("/notifications", get(notifications))
}

async fn notifications(
    ws: WebSocketUpgrade,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    ws.on_upgrade(move |socket| stream_notifications(socket, app_state, user))
}

async fn stream_notifications(socket: WebSocket, app_state: Arc<AppState>, user: CurrentUser) {
    let (mut sender, mut receiver) = socket.split();
    let mut notifications = app_state.notifications.subscribe();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "notification socket receive error");
                        break;
                    }
                    _ => {}
                }
            }

            event = notifications.recv() => {
                match event {
                    Ok(notification) if notification.recipient == user.username => {
                        let payload = match serde_json::to_string(&notification) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!(error = %e, "failed to encode notification");
                                continue;
                            }
                        };
                        if let Err(e) = sender.send(Message::Text(payload.into())).await {
                            warn!(error = %e, "failed to send notification");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, username = %user.username, "notification socket lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    debug!(username = %user.username, "notification socket closed");
}
