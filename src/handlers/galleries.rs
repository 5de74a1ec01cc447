use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::{
    crypto::csrf::CsrfToken,
    error::Result,
    handlers::users::{CsrfForm, form_error_status},
    middleware_layer::auth::CurrentUser,
    models::{gallery::Gallery, user::User},
    state::AppState,
    views::{
        Alert, HtmlTemplate,
        templates::{
            EditGalleryTemplate, GalleriesIndexTemplate, NewGalleryTemplate, ShowGalleryTemplate,
        },
    },
};

/// The form for creating or renaming a gallery.
#[derive(Deserialize)]
pub struct GalleryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub csrf_token: String,
}

pub(crate) fn edit_path(gallery_id: i64) -> String {
    format!("/galleries/{}/edit", gallery_id)
}

/// GET /galleries
pub async fn index(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
) -> Result<Response> {
    let galleries = state.galleries.by_user_id(user.id).await?;
    let page = state.views.page(&cookies, Some(user), &csrf);
    Ok(HtmlTemplate::new(GalleriesIndexTemplate { page, galleries }).into_response())
}

/// GET /galleries/new
pub async fn new(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
) -> impl IntoResponse {
    let page = state.views.page(&cookies, Some(user), &csrf);
    HtmlTemplate::new(NewGalleryTemplate {
        page,
        title: String::new(),
    })
}

/// POST /galleries
pub async fn create(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Form(form): Form<GalleryForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;

    match state
        .galleries
        .create(Gallery::new(user.id, form.title.clone()))
        .await
    {
        Ok(gallery) => Ok(state
            .views
            .redirect_with_alert(
                &cookies,
                &edit_path(gallery.id),
                Alert::success("Gallery created"),
            )
            .into_response()),
        Err(e) => {
            let page = state.views.page(&cookies, Some(user), &csrf).with_error(&e);
            let template = NewGalleryTemplate {
                page,
                title: form.title,
            };
            Ok(HtmlTemplate::with_status(template, form_error_status(&e)).into_response())
        }
    }
}

/// GET /galleries/{id}
///
/// Public: anyone holding the link can view a gallery.
pub async fn show(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let gallery = state.galleries.by_id(id).await?;
    let images = state.images.by_gallery_id(gallery.id).await?;
    let page = state.views.page(&cookies, current.0, &csrf);
    Ok(HtmlTemplate::new(ShowGalleryTemplate {
        page,
        gallery,
        images,
    })
    .into_response())
}

/// GET /galleries/{id}/edit
pub async fn edit(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let gallery = state.galleries.owned_by(id, &user).await?;
    let images = state.images.by_gallery_id(gallery.id).await?;
    let page = state.views.page(&cookies, Some(user), &csrf);
    Ok(HtmlTemplate::new(EditGalleryTemplate {
        page,
        gallery,
        images,
    })
    .into_response())
}

/// POST /galleries/{id}/update
pub async fn update(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Form(form): Form<GalleryForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    let mut gallery = state.galleries.owned_by(id, &user).await?;
    gallery.title = form.title;

    match state.galleries.update(gallery.clone()).await {
        Ok(gallery) => Ok(state
            .views
            .redirect_with_alert(
                &cookies,
                &edit_path(gallery.id),
                Alert::success("Gallery successfully updated"),
            )
            .into_response()),
        Err(e) => {
            let images = state.images.by_gallery_id(gallery.id).await?;
            let page = state.views.page(&cookies, Some(user), &csrf).with_error(&e);
            let template = EditGalleryTemplate {
                page,
                gallery,
                images,
            };
            Ok(HtmlTemplate::with_status(template, form_error_status(&e)).into_response())
        }
    }
}

/// POST /galleries/{id}/delete
///
/// Removes the gallery's images from disk before the row itself.
pub async fn delete(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Form(form): Form<CsrfForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    let gallery = state.galleries.owned_by(id, &user).await?;

    state.images.delete_gallery(gallery.id).await?;
    state.galleries.delete(gallery.id).await?;

    Ok(state
        .views
        .redirect_with_alert(&cookies, "/galleries", Alert::success("Gallery deleted"))
        .into_response())
}
