use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{models::user::User, state::AppState};

/// The name of the cookie holding the raw remember token.
pub const REMEMBER_COOKIE: &str = "remember_token";

/// The user signed in on the current request, if any.
///
/// Inserted into the request extensions by [`load_user`] on every request.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<User>);

/// Paths served straight from disk never need the user record.
fn is_static_path(path: &str) -> bool {
    path.starts_with("/assets/") || path.starts_with("/images/")
}

/// A middleware that resolves the remember cookie to a user.
///
/// A missing cookie or a failed lookup leaves the request unauthenticated;
/// neither is an error.
pub async fn load_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_static_path(request.uri().path()) {
        return next.run(request).await;
    }

    let user = match cookies.get(REMEMBER_COOKIE) {
        Some(cookie) => match state.users.by_remember(cookie.value()).await {
            Ok(user) => {
                tracing::debug!("🔑 Request authenticated as user: {}", user.id);
                Some(user)
            }
            Err(e) => {
                tracing::debug!("Remember cookie did not resolve to a user: {}", e);
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// A middleware that requires a signed-in user.
///
/// Redirects to `/login` when [`load_user`] found nobody; otherwise the user
/// is made available to handlers as `Extension<User>`.
pub async fn require_user(mut request: Request<Body>, next: Next) -> Response {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone());

    match user {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::debug!("❌ No signed-in user for {}", request.uri().path());
            Redirect::to("/login").into_response()
        }
    }
}
