use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::{Cookie, Cookies};

use crate::state::AppState;

/// The cookie holding the browser's CSRF seed.
pub const CSRF_COOKIE: &str = "csrf_seed";

/// A middleware that makes the request's CSRF token available to handlers.
///
/// Issues a seed cookie when the browser has none, then inserts the derived
/// [`CsrfToken`](crate::crypto::csrf::CsrfToken) into the request extensions.
/// Handlers that accept a form compare the submitted `csrf_token` field
/// against it.
pub async fn issue_csrf(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let seed = match cookies.get(CSRF_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => {
            let seed = match state.csrf.generate_seed() {
                Ok(seed) => seed,
                Err(e) => return e.into_response(),
            };
            let mut cookie = Cookie::new(CSRF_COOKIE, seed.clone());
            cookie.set_http_only(true);
            cookie.set_secure(state.config.is_prod());
            cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
            cookie.set_path("/");
            cookies.add(cookie);
            tracing::debug!("🔐 Issued new CSRF seed");
            seed
        }
    };

    req.extensions_mut().insert(state.csrf.token_for(&seed));
    next.run(req).await
}
