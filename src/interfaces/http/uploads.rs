use super::SharedState;
use crate::domain::record::Id;
use crate::domain::upload::StoredFile;
use crate::error::{PortalError, Result};
use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartError,
    },
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};

const FILE_FIELD: &str = "file";

pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>)> {
    let limit = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        if bytes.len() > limit {
            return Err(PortalError::PayloadTooLarge { limit });
        }

        let file = state.uploads.upload(&name, &content_type, &bytes).await?;
        return Ok((StatusCode::CREATED, Json(file)));
    }

    Err(PortalError::ValidationError(format!(
        "Multipart field `{FILE_FIELD}` is required"
    )))
}

pub async fn download(State(state): State<SharedState>, Path(id): Path<Id>) -> Result<Response> {
    let (file, bytes) = state.uploads.download(&id).await?;
    let filename: String = file
        .original_name
        .chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .collect();
    let disposition = format!("inline; filename=\"{filename}\"");

    Ok((
        [(CONTENT_TYPE, file.content_type), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response())
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<StoredFile>>> {
    Ok(Json(state.uploads.list().await?))
}

pub async fn remove(State(state): State<SharedState>, Path(id): Path<Id>) -> Result<StatusCode> {
    state.uploads.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(e: MultipartError, limit: usize) -> PortalError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PortalError::PayloadTooLarge { limit }
    } else {
        PortalError::ValidationError(e.body_text())
    }
}
