use std::io;

use axum::{
    Extension, Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tower_cookies::Cookies;

use crate::{
    crypto::csrf::CsrfToken,
    error::{AppError, Result},
    handlers::{galleries::edit_path, users::CsrfForm},
    models::{image::Image, user::User},
    state::AppState,
    views::{ALERT_LEVEL_WARNING, Alert},
};

const CSRF_FIELD: &str = "csrf_token";
const IMAGES_FIELD: &str = "images";

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Multipart(e.to_string())
}

/// POST /galleries/{id}/images
///
/// Streams every file in the `images` field straight to disk. The
/// `csrf_token` field has to come first in the form, so nothing is written
/// before the request is verified.
pub async fn upload(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Response> {
    let gallery = state.galleries.owned_by(id, &user).await?;
    let redirect_to = edit_path(gallery.id);

    let mut verified = false;
    let mut uploaded = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(CSRF_FIELD) => {
                let token = field.text().await.map_err(multipart_error)?;
                csrf.verify(&token)?;
                verified = true;
            }
            Some(IMAGES_FIELD) => {
                if !verified {
                    return Err(AppError::CsrfMismatch);
                }
                // Browsers send an empty part when no file was chosen.
                let filename = match field.file_name() {
                    Some(filename) if !filename.is_empty() => filename.to_string(),
                    _ => continue,
                };

                let reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
                match state.images.create(gallery.id, &filename, reader).await {
                    Ok(_) => uploaded += 1,
                    Err(e) if e.is_public() => {
                        return Ok(state
                            .views
                            .redirect_with_alert(&cookies, &redirect_to, Alert::from_error(&e))
                            .into_response());
                    }
                    Err(e) => return Err(e),
                }
            }
            _ => {}
        }
    }

    if !verified {
        return Err(AppError::CsrfMismatch);
    }

    let alert = match uploaded {
        0 => Alert::new(ALERT_LEVEL_WARNING, "Choose at least one image to upload"),
        1 => Alert::success("1 image uploaded"),
        n => Alert::success(format!("{} images uploaded", n)),
    };
    Ok(state
        .views
        .redirect_with_alert(&cookies, &redirect_to, alert)
        .into_response())
}

/// POST /galleries/{id}/images/{filename}/delete
pub async fn delete(
    State(state): State<AppState>,
    cookies: Cookies,
    Extension(csrf): Extension<CsrfToken>,
    Extension(user): Extension<User>,
    Path((id, filename)): Path<(i64, String)>,
    Form(form): Form<CsrfForm>,
) -> Result<Response> {
    csrf.verify(&form.csrf_token)?;
    let gallery = state.galleries.owned_by(id, &user).await?;

    state
        .images
        .delete(&Image::new(gallery.id, filename))
        .await?;

    Ok(state
        .views
        .redirect_with_alert(&cookies, &edit_path(gallery.id), Alert::success("Image deleted"))
        .into_response())
}
