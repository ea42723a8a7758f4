use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};

use crate::{models::users::CurrentUser, Error, Result};

pub const USERNAME_HEADER: &str = "x-username";
pub const FULLNAME_HEADER: &str = "x-fullname";

/// Authentication happens upstream; the gateway forwards who the caller is.
pub async fn session(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let user = current_user(req.headers())?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

pub fn current_user(headers: &HeaderMap) -> Result<CurrentUser> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let username = header(USERNAME_HEADER).ok_or(Error::Unauthorized)?;
    let fullname = header(FULLNAME_HEADER).unwrap_or_default();

    Ok(CurrentUser::new(username, fullname))
}
