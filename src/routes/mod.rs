use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware, Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{feed::feed_handler, notifications::notifications_handler, posts::posts_handler},
    middleware::{session, FULLNAME_HEADER, USERNAME_HEADER},
    storage::local::MEDIA_ROUTE,
    AppState,
};

pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(USERNAME_HEADER),
            HeaderName::from_static(FULLNAME_HEADER),
        ])
}

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .merge(posts_handler())
        .merge(feed_handler())
        .merge(notifications_handler())
        .layer(middleware::from_fn(session))
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(Extension(app_state.clone()));

    Router::new()
        .nest("/api", api_route)
        .nest_service(MEDIA_ROUTE, ServeDir::new(&app_state.config.media_dir))
        .layer(configure_cors())
        .layer(TraceLayer::new_for_http())
}
