use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Builds the application's router.
pub fn build(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/contact", get(handlers::pages::contact))
        .route(
            "/signup",
            get(handlers::users::signup_form).post(handlers::users::signup),
        )
        .route(
            "/login",
            get(handlers::users::login_form).post(handlers::users::login),
        )
        .route("/galleries/{id}", get(handlers::galleries::show))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/logout", post(handlers::users::logout))
        .route(
            "/galleries",
            get(handlers::galleries::index).post(handlers::galleries::create),
        )
        .route("/galleries/new", get(handlers::galleries::new))
        .route("/galleries/{id}/edit", get(handlers::galleries::edit))
        .route("/galleries/{id}/update", post(handlers::galleries::update))
        .route("/galleries/{id}/delete", post(handlers::galleries::delete))
        .route("/galleries/{id}/images", post(handlers::images::upload))
        .route(
            "/galleries/{id}/images/{filename}/delete",
            post(handlers::images::delete),
        )
        .route_layer(from_fn(middleware_layer::auth::require_user))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/assets", ServeDir::new(&state.config.assets_dir))
        .nest_service("/images", ServeDir::new(state.images.root()))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::load_user,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::issue_csrf,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
}
