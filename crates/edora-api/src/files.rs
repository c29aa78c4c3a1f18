use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use edora_db::models::NewMediaFile;
use edora_types::api::MediaFileResponse;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::permissions::require_post_edit_permission;
use crate::posts::load_visible_post;
use crate::state::{AppState, blocking};
use crate::views;

pub const MAX_FILES_PER_UPLOAD: usize = 10;

struct PendingFile {
    name: Option<String>,
    mime_type: String,
    data: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::bad_request(e.body_text())
}

/// POST /files/upload: multipart with one or more `files` parts and an
/// optional `post_id`. Everything is read and checked before anything is
/// written to storage.
pub async fn upload_files(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let max_bytes = state.settings.max_upload_bytes;
    let mut pending: Vec<PendingFile> = Vec::new();
    let mut post_id: Option<i64> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("files") => {
                if pending.len() == MAX_FILES_PER_UPLOAD {
                    return Err(ApiError::bad_request("too many files (max 10)"));
                }
                let name = field.file_name().map(str::to_string);
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    if data.len() + chunk.len() > max_bytes {
                        return Err(ApiError::bad_request("file too large"));
                    }
                    data.extend_from_slice(&chunk);
                }
                pending.push(PendingFile {
                    name,
                    mime_type,
                    data,
                });
            }
            Some("post_id") => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = text
                        .parse()
                        .map_err(|_| ApiError::bad_request("post_id must be an integer"))?;
                    post_id = Some(id);
                }
            }
            other => {
                warn!("Ignoring unexpected upload field {:?}", other);
            }
        }
    }

    if pending.is_empty() {
        return Err(ApiError::bad_request("no files uploaded"));
    }

    if let Some(post_id) = post_id {
        let post = load_visible_post(&state, &user, post_id).await?;
        require_post_edit_permission(&user, &post)?;
    }

    let mut stored: Vec<NewMediaFile> = Vec::with_capacity(pending.len());
    for file in &pending {
        match state.storage.save(file.name.as_deref(), &file.data).await {
            Ok(saved) => stored.push(NewMediaFile {
                filename: saved.relative_path,
                mime_type: file.mime_type.clone(),
                size: saved.size as i64,
                sha256: saved.sha256,
            }),
            Err(e) => {
                let written: Vec<String> = stored.into_iter().map(|f| f.filename).collect();
                state.storage.delete_all(&written).await;
                return Err(e.into());
            }
        }
    }

    let written: Vec<String> = stored.iter().map(|f| f.filename.clone()).collect();
    let uploader_id = user.id;
    let inserted =
        blocking(&state, move |db| db.insert_media_files(&stored, post_id, uploader_id)).await;
    let rows = match inserted {
        Ok(rows) => rows,
        Err(e) => {
            error!("Recording uploads failed, removing {} stored files", written.len());
            state.storage.delete_all(&written).await;
            return Err(e);
        }
    };

    info!("User {} uploaded {} files (post {:?})", uploader_id, rows.len(), post_id);

    let files: Vec<MediaFileResponse> = rows.into_iter().map(views::media_file).collect();
    Ok((StatusCode::CREATED, Json(files)))
}

/// GET /files/{id}: streams the stored bytes with their MIME type.
/// The sha256 doubles as a strong ETag.
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let row = blocking(&state, move |db| db.get_media_file(file_id))
        .await?
        .ok_or(ApiError::NotFound("File not found"))?;

    let etag = HeaderValue::from_str(&format!("\"{}\"", row.sha256))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad etag for file {}: {}", file_id, e)))?;

    if headers.get(header::IF_NONE_MATCH) == Some(&etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let file = match state.storage.open(&row.filename).await {
        Ok(file) => file,
        Err(e) => {
            error!("Stored file {} for media {} is unreadable: {}", row.filename, file_id, e);
            return Err(ApiError::NotFound("File not found"));
        }
    };

    let content_type = HeaderValue::from_str(&row.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(row.size)),
            (header::ETAG, etag),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
