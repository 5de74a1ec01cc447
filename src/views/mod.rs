//! View rendering: the shared page data (current user, flash alert, CSRF
//! token), one-shot alert cookies and the askama response wrapper.

pub mod templates;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use base64::{Engine as _, engine::general_purpose};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    crypto::csrf::CsrfToken,
    error::{AppError, GENERIC_MESSAGE},
    models::user::User,
};

pub const ALERT_LEVEL_COOKIE: &str = "alert_level";
pub const ALERT_MESSAGE_COOKIE: &str = "alert_message";

/// Bootstrap-style alert levels.
pub const ALERT_LEVEL_ERROR: &str = "danger";
pub const ALERT_LEVEL_WARNING: &str = "warning";
pub const ALERT_LEVEL_INFO: &str = "info";
pub const ALERT_LEVEL_SUCCESS: &str = "success";

/// A notification rendered at the top of a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub level: String,
    pub message: String,
}

impl Alert {
    pub fn new(level: &str, message: impl Into<String>) -> Self {
        Self {
            level: level.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ALERT_LEVEL_ERROR, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ALERT_LEVEL_SUCCESS, message)
    }

    /// The alert for a failed operation: public errors are shown verbatim,
    /// everything else is logged and replaced by the generic message.
    pub fn from_error(err: &AppError) -> Self {
        match err.public_message() {
            Some(message) => Self::error(message),
            None => {
                tracing::error!("❌ {}", err);
                Self::error(GENERIC_MESSAGE)
            }
        }
    }

    fn is_known_level(level: &str) -> bool {
        matches!(
            level,
            ALERT_LEVEL_ERROR | ALERT_LEVEL_WARNING | ALERT_LEVEL_INFO | ALERT_LEVEL_SUCCESS
        )
    }
}

/// Settings for the view layer, fixed at construction.
#[derive(Clone, Debug)]
pub struct ViewConfig {
    /// The name shown in the navigation bar.
    pub brand_name: String,
    /// Whether cookies set by the view layer carry the `Secure` flag.
    pub secure_cookies: bool,
    /// How long a flash alert survives a redirect.
    pub alert_ttl: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            brand_name: "Shutterbox".to_string(),
            secure_cookies: false,
            alert_ttl: Duration::minutes(5),
        }
    }
}

/// Data every page layout receives.
#[derive(Clone, Debug)]
pub struct Page {
    pub brand_name: String,
    pub user: Option<User>,
    pub alert: Option<Alert>,
    pub csrf_token: String,
}

impl Page {
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Replaces any flash alert with one describing `err`.
    pub fn with_error(mut self, err: &AppError) -> Self {
        self.alert = Some(Alert::from_error(err));
        self
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }
}

/// Builds page data and handles one-shot alerts.
#[derive(Clone, Debug)]
pub struct Views {
    config: ViewConfig,
}

impl Views {
    pub fn new(config: ViewConfig) -> Self {
        Self { config }
    }

    /// The page data for the current request.
    ///
    /// A flash alert persisted by a previous redirect is taken out of the
    /// cookies, so it is displayed exactly once.
    pub fn page(&self, cookies: &Cookies, user: Option<User>, csrf: &CsrfToken) -> Page {
        Page {
            brand_name: self.config.brand_name.clone(),
            user,
            alert: self.take_alert(cookies),
            csrf_token: csrf.as_str().to_string(),
        }
    }

    /// Redirects to `to`, persisting `alert` for the next page rendered.
    pub fn redirect_with_alert(&self, cookies: &Cookies, to: &str, alert: Alert) -> Redirect {
        self.persist_alert(cookies, &alert);
        Redirect::to(to)
    }

    fn alert_cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_http_only(true);
        cookie.set_secure(self.config.secure_cookies);
        cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
        cookie.set_path("/");
        cookie
    }

    fn persist_alert(&self, cookies: &Cookies, alert: &Alert) {
        // Messages contain spaces and punctuation, which are not valid in a
        // cookie value.
        let message = general_purpose::URL_SAFE_NO_PAD.encode(alert.message.as_bytes());

        let mut level = self.alert_cookie(ALERT_LEVEL_COOKIE, alert.level.clone());
        level.set_max_age(self.config.alert_ttl);
        let mut message = self.alert_cookie(ALERT_MESSAGE_COOKIE, message);
        message.set_max_age(self.config.alert_ttl);

        cookies.add(level);
        cookies.add(message);
    }

    fn take_alert(&self, cookies: &Cookies) -> Option<Alert> {
        let level = cookies.get(ALERT_LEVEL_COOKIE)?;
        let message = cookies.get(ALERT_MESSAGE_COOKIE)?;

        cookies.remove(self.alert_cookie(ALERT_LEVEL_COOKIE, String::new()));
        cookies.remove(self.alert_cookie(ALERT_MESSAGE_COOKIE, String::new()));

        let bytes = general_purpose::URL_SAFE_NO_PAD.decode(message.value()).ok()?;
        let message = String::from_utf8(bytes).ok()?;
        if !Alert::is_known_level(level.value()) {
            return None;
        }
        Some(Alert::new(level.value(), message))
    }
}

/// Wrapper that converts askama templates into axum responses with logging.
pub struct HtmlTemplate<T: Template> {
    template: T,
    status: StatusCode,
}

impl<T: Template> HtmlTemplate<T> {
    pub fn new(template: T) -> Self {
        Self {
            template,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(template: T, status: StatusCode) -> Self {
        Self { template, status }
    }
}

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(err) => AppError::from(err).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_errors_become_their_message() {
        let alert = Alert::from_error(&AppError::ShortPassword);
        assert_eq!(alert.level, ALERT_LEVEL_ERROR);
        assert_eq!(alert.message, "Password length must be at least 8 characters");
    }

    #[test]
    fn private_errors_become_generic() {
        let alert = Alert::from_error(&AppError::RequiredRemember);
        assert_eq!(alert.message, GENERIC_MESSAGE);
    }

    #[test]
    fn known_levels() {
        assert!(Alert::is_known_level("success"));
        assert!(!Alert::is_known_level("<script>"));
    }
}
