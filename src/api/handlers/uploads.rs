//! Image upload handler
//!
//! Accepts one multipart file under the field name `image`, writes it to the
//! configured upload directory under a collision-free name and returns that
//! name. The file is later served statically from `/images/{filename}`.

use std::path::PathBuf;

use axum::{extract::Multipart, extract::State, Json};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::dto::MessageResponse;
use crate::error::ApiError;

/// State for the upload handler
#[derive(Clone)]
pub struct UploadState {
    pub dir: PathBuf,
}

/// Successful upload response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Stored file name, servable as `/images/{filename}`
    pub filename: String,
}

// `<millis>-<random>` plus the original extension (lowercased, `.jpg` when
// the client sent none). The extension comes from `Path::extension`, which
// cannot carry path separators.
fn stored_filename(original: Option<&str>) -> String {
    let extension = original
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| ".jpg".to_string());

    let unique: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}{}", Utc::now().timestamp_millis(), unique, extension)
}

/// Upload an image
///
/// Multipart form with the file under field `image`, 5 MB cap enforced by
/// the route's body limit.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "Upload",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file under the `image` field", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = MessageResponse)
    )
)]
pub async fn upload_image(
    State(state): State<UploadState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = stored_filename(field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let target = state.dir.join(&filename);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to store upload: {e}")))?;

        tracing::debug!(filename, size = bytes.len(), "image stored");
        return Ok(Json(UploadResponse { filename }));
    }

    Err(ApiError::validation(
        "No file uploaded (field name must be: image)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn app(dir: PathBuf) -> Router {
        Router::new()
            .route("/api/upload", post(upload_image))
            .with_state(UploadState { dir })
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn stores_file_and_returns_filename() {
        let dir = std::env::temp_dir().join(format!("upload-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let response = app(dir.clone())
            .oneshot(multipart_request("image", "photo.PNG", b"fake image bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let filename = body["filename"].as_str().unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(
            std::fs::read(dir.join(filename)).unwrap(),
            b"fake image bytes"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_extension_falls_back_to_jpg() {
        assert!(stored_filename(Some("photo")).ends_with(".jpg"));
        assert!(stored_filename(None).ends_with(".jpg"));
    }

    #[tokio::test]
    async fn wrong_field_name_is_rejected() {
        let dir = std::env::temp_dir();
        let response = app(dir)
            .oneshot(multipart_request("file", "photo.png", b"bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "No file uploaded (field name must be: image)");
    }
}
