use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, warn};

use crate::{models::users::CurrentUser, AppState, Error, Result};

pub fn feed_handler() -> Router {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/live", get(live_profile))
}

async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let mut viewer = app_state.feed_for(&user);
    viewer.activate().await?;
    let view = viewer.next_view().await.ok_or(Error::InternalServerError)?;
    viewer.deactivate();

    Ok(Json(view))
}

async fn live_profile(
    ws: WebSocketUpgrade,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    ws.on_upgrade(move |socket| stream_profile(socket, app_state, user))
}

async fn stream_profile(socket: WebSocket, app_state: Arc<AppState>, user: CurrentUser) {
    let (mut sender, mut receiver) = socket.split();

    let mut viewer = app_state.feed_for(&user);
    if let Err(err) = viewer.activate().await {
        warn!(error = %err, username = %user.username, "could not open feed subscription");
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(username = %user.username, "profile socket closed");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "profile socket receive error");
                        break;
                    }
                    _ => {}
                }
            }

            view = viewer.next_view() => {
                let Some(view) = view else { break };
                let payload = match serde_json::to_string(&view) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "failed to encode feed view");
                        continue;
                    }
                };

                if let Err(e) = sender.send(Message::Text(payload.into())).await {
                    warn!(error = %e, "failed to send feed view");
                    break;
                }
            }
        }
    }

    viewer.deactivate();
}
