use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies};

use crate::{
    crypto::csrf::CsrfToken,
    error::{AppError, Result},
    middleware_layer::auth::{CurrentUser, REMEMBER_COOKIE},
    models::user::User,
    state::AppState,
    views::{
        Alert, HtmlTemplate,
        templates::{LoginTemplate, SignupTemplate},
    },
};

/// The signup form.
#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// The login form.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// A form that only carries the CSRF token.
#[derive(Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// The status for a form re-rendered after `err`.
pub(crate) fn form_error_status(err: &AppError) -> StatusCode {
    if err.is_public() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn remember_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(REMEMBER_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_path("/");
    cookie
}

/// Rotates the user's remember token and hands the new one to the browser.
async fn sign_in(state: &AppState, cookies: &Cookies, user: User) -> Result<User> {
    let (user, remember) = state.users.rotate_remember(user).await?;
    cookies.add(remember_cookie(remember, state.config.is_prod()));
    tracing::info!("✅ User signed in: {}", user.id);
    Ok(user)
}

/// GET /signup
pub async fn signup_form(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
) -> impl IntoResponse {
    let page = state.views.page(&cookies, current.0, &csrf);
    HtmlTemplate::new(SignupTemplate::new(page))
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    tracing::info!("📝 Signup attempt for: {}", form.email.trim());

    let user = User::new(form.name.clone(), form.email.clone(), form.password);
    let user = match state.users.create(user).await {
        Ok(user) => user,
        Err(e) => {
            let page = state.views.page(&cookies, current.0, &csrf).with_error(&e);
            let template = SignupTemplate {
                page,
                name: form.name,
                email: form.email,
            };
            return Ok(HtmlTemplate::with_status(template, form_error_status(&e)).into_response());
        }
    };

    if let Err(e) = sign_in(&state, &cookies, user).await {
        tracing::error!("❌ Failed to sign in new user: {}", e);
        return Ok(Redirect::to("/login").into_response());
    }
    Ok(Redirect::to("/").into_response())
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
) -> impl IntoResponse {
    let page = state.views.page(&cookies, current.0, &csrf);
    HtmlTemplate::new(LoginTemplate {
        page,
        email: String::new(),
    })
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    tracing::info!("🔐 Login attempt for: {}", form.email.trim());

    let result = match state.users.authenticate(&form.email, &form.password).await {
        Ok(user) => sign_in(&state, &cookies, user).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) => {
            let (alert, status) = match e {
                AppError::NotFound | AppError::InvalidPassword => (
                    Alert::error("Invalid email address or password"),
                    StatusCode::UNAUTHORIZED,
                ),
                // Malformed addresses get the same answer as unknown ones.
                AppError::RequiredEmail | AppError::InvalidEmail => (
                    Alert::error("Invalid email address or password"),
                    StatusCode::UNAUTHORIZED,
                ),
                ref other => (Alert::from_error(other), form_error_status(other)),
            };
            let page = state
                .views
                .page(&cookies, current.0, &csrf)
                .with_alert(alert);
            let template = LoginTemplate {
                page,
                email: form.email,
            };
            Ok(HtmlTemplate::with_status(template, status).into_response())
        }
    }
}

/// POST /logout
///
/// Rotates the remember token so the cookie the browser held stops working
/// even if it was copied elsewhere.
pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Form(form): Form<CsrfForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    let user_id = user.id;

    state.users.rotate_remember(user).await?;
    cookies.remove(remember_cookie(String::new(), state.config.is_prod()));

    tracing::info!("👋 User logged out: {}", user_id);
    Ok(Redirect::to("/").into_response())
}
