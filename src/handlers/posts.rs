use std::sync::Arc;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use crate::{
    models::{media::SelectedFile, response::PreviewResponse, users::CurrentUser},
    services::composer::NO_FILE_MESSAGE,
    AppState, Error, Result,
};

pub fn posts_handler() -> Router {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/preview", post(preview_post))
}

#[derive(Debug, Default)]
struct PostForm {
    file: Option<SelectedFile>,
    caption: String,
}

async fn read_form(mut multipart: Multipart) -> Result<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.file = Some(SelectedFile::new(name, content_type, bytes));
                }
            }
            Some("caption") => form.caption = field.text().await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_form(multipart).await?;

    let mut composer = app_state.composer_for(&user);
    composer.open();
    if let Some(file) = form.file {
        composer.select_file(file)?;
        composer.set_caption(form.caption);
    }

    let post = composer.publish().await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn preview_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let file = read_form(multipart)
        .await?
        .file
        .ok_or_else(|| Error::Validation(NO_FILE_MESSAGE.to_string()))?;

    let mut composer = app_state.composer_for(&user);
    composer.select_file(file)?;
    let preview = composer
        .settle_preview()
        .await
        .ok_or_else(|| Error::Decode("preview unavailable".to_string()))?;

    Ok(Json(PreviewResponse {
        status: "success",
        preview,
    }))
}
