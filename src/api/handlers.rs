use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{Result, ServerError};
use crate::heroes::validation::{validate_new, validate_patch};
use crate::heroes::{
    NewSuperhero, PageRequest, Paginated, Superhero, SuperheroPatch, SuperheroWithImages,
};
use crate::storage::StorageError;
use crate::upload::{UploadResponse, UploadedFile};

use super::AppState;

/// Multipart field carrying the image
const UPLOAD_FIELD: &str = "file";

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServerError::Validation(rejection.body_text()))
}

/// GET /superheroes?page&limit
pub async fn list_superheroes(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<Paginated<SuperheroWithImages>>> {
    let Query(request) =
        query.map_err(|rejection| ServerError::Validation(rejection.body_text()))?;
    tracing::debug!("list_superheroes: page={:?} limit={:?}", request.page, request.limit);
    Ok(Json(state.catalog.list(request).await?))
}

/// GET /superheroes/:id
pub async fn get_superhero(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuperheroWithImages>> {
    Ok(Json(state.catalog.get(&id).await?))
}

/// POST /superheroes
pub async fn create_superhero(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<NewSuperhero>, JsonRejection>,
) -> Result<(StatusCode, Json<SuperheroWithImages>)> {
    let new = json_body(payload)?;
    validate_new(&new)?;
    let created = state.catalog.create(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /superheroes/:id
pub async fn update_superhero(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<SuperheroPatch>, JsonRejection>,
) -> Result<Json<SuperheroWithImages>> {
    let patch = json_body(payload)?;
    validate_patch(&patch)?;
    Ok(Json(state.catalog.update(&id, patch).await?))
}

/// DELETE /superheroes/:id
pub async fn delete_superhero(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Superhero>> {
    Ok(Json(state.catalog.delete(&id).await?))
}

/// POST /upload (multipart, field `file`)
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut multipart = multipart
        .map_err(|_| ServerError::UploadRejected("No file uploaded".to_string()))?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::UploadRejected(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::UploadRejected(format!("Malformed upload: {}", e)))?;
        file = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let response = state.uploads.upload(file).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /images/:key - serve an uploaded image
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response> {
    let (content_type, data) = state.uploads.fetch(&key).await.map_err(|e| match e {
        ServerError::Storage(StorageError::InvalidKey(key)) => {
            ServerError::Storage(StorageError::NotFound(key))
        }
        other => other,
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    )
        .into_response())
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::config::AppConfig;
    use crate::storage::LocalStorage;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::Router;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::from_lookup(|key| match key {
            "SUPERHERO_DATA_DIR" => Some(dir.path().display().to_string()),
            "SUPERHERO_PUBLIC_URL" => Some("http://heroes.test".to_string()),
            _ => None,
        });
        let db = crate::db::init_database(&config.db_path()).await.unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path().join("blobs")));
        let state = Arc::new(AppState::new(Arc::new(db), storage, &config));
        (dir, router(state, config.max_upload_bytes))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, bytes) = send(app, request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn superman() -> Value {
        json!({
            "nickname": "Superman",
            "realName": "Clark Kent",
            "originDescription": "He came from Krypton.",
            "superpowers": ["Flight", "Super Strength"],
            "catchPhrase": "Up, up and away!",
            "images": ["http://example.com/u1.jpg", "http://example.com/u2.jpg"]
        })
    }

    fn multipart_body(boundary: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"hero.png\"\r\n",
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body
    }

    #[tokio::test]
    async fn test_crud_round() {
        let (_dir, app) = test_app().await;

        let (status, created) = send_json(&app, "POST", "/superheroes", Some(superman())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["images"].as_array().unwrap().len(), 2);

        let (status, patched) = send_json(
            &app,
            "PATCH",
            &format!("/superheroes/{}", id),
            Some(json!({ "nickname": "Superman Prime", "images": ["http://example.com/u2.jpg", "http://example.com/u3.jpg"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["nickname"], "Superman Prime");
        assert_eq!(
            patched["images"],
            json!([{ "url": "http://example.com/u3.jpg" }, { "url": "http://example.com/u2.jpg" }])
        );

        let (status, fetched) = send_json(&app, "GET", &format!("/superheroes/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, patched);

        let (status, listed) = send_json(&app, "GET", "/superheroes?page=1&limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["items"][0]["images"], json!([{ "url": "http://example.com/u3.jpg" }]));

        let (status, deleted) = send_json(&app, "DELETE", &format!("/superheroes/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["id"], id.as_str());

        let (status, body) = send_json(&app, "GET", &format!("/superheroes/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "statusCode": 404, "message": "Superhero not found" }));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (_dir, app) = test_app().await;

        let (status, _) = send_json(&app, "PATCH", "/superheroes/nope", Some(json!({ "nickname": "X" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(&app, "DELETE", "/superheroes/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut invalid = superman();
        invalid["superpowers"] = json!([]);
        let (status, body) = send_json(&app, "POST", "/superheroes", Some(invalid)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "superpowers should not be empty");

        let (status, _) = send_json(&app, "POST", "/superheroes", Some(json!({ "nickname": "Half" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(&app, "GET", "/superheroes?page=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for uri in ["/superheroes?page=abc", "/superheroes?limit=-1"] {
            let (status, body) = send_json(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["statusCode"], 400);
            assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        }

        let (status, body) =
            send_json(&app, "GET", "/superheroes?page=18446744073709551615&limit=100", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "items": [], "total": 0 }));
    }

    #[tokio::test]
    async fn test_upload_and_serve() {
        let (_dir, app) = test_app().await;
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let boundary = "heroboundary";

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(multipart_body(boundary, "image/png", png)))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let response: UploadResponse = serde_json::from_slice(&body).unwrap();
        let path = response.url.strip_prefix("http://heroes.test").unwrap().to_string();
        assert!(path.starts_with("/images/"));

        let request = Request::builder().uri(&path).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let served = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(served.as_ref(), png);

        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(multipart_body(boundary, "application/pdf", b"%PDF-1.7")))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Only image files are allowed");

        let (status, body) = send_json(&app, "POST", "/upload", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No file uploaded");

        let (status, _) = send_json(&app, "GET", "/images/..secret", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
