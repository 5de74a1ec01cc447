use axum::{Extension, extract::State, response::IntoResponse};
use tower_cookies::Cookies;

use crate::{
    crypto::csrf::CsrfToken,
    middleware_layer::auth::CurrentUser,
    state::AppState,
    views::{
        HtmlTemplate,
        templates::{ContactTemplate, HomeTemplate},
    },
};

/// GET /
pub async fn home(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
) -> impl IntoResponse {
    HtmlTemplate::new(HomeTemplate {
        page: state.views.page(&cookies, current.0, &csrf),
    })
}

/// GET /contact
pub async fn contact(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
) -> impl IntoResponse {
    HtmlTemplate::new(ContactTemplate {
        page: state.views.page(&cookies, current.0, &csrf),
    })
}
