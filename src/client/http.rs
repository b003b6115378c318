//! `SuperheroApi` over HTTP with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::api::{ClientError, ClientResult, ImageFile, SuperheroApi};
use crate::heroes::{NewSuperhero, Paginated, Superhero, SuperheroPatch, SuperheroWithImages};
use crate::upload::UploadResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HttpSuperheroApi {
    client: Client,
    base_url: String,
}

impl HttpSuperheroApi {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn hero_url(&self, id: &str) -> String {
        self.url(&format!("/superheroes/{}", id))
    }
}

/// Decode a 2xx body, or turn the server's error body into `ClientError::Api`.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    tracing::debug!("Request failed with {}: {}", status, message);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SuperheroApi for HttpSuperheroApi {
    async fn fetch_superheroes(&self, page: u64, limit: u64) -> ClientResult<Paginated<SuperheroWithImages>> {
        let response = self
            .client
            .get(self.url("/superheroes"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_superhero(&self, id: &str) -> ClientResult<SuperheroWithImages> {
        let response = self.client.get(self.hero_url(id)).send().await?;
        decode(response).await
    }

    async fn create_superhero(&self, data: &NewSuperhero) -> ClientResult<SuperheroWithImages> {
        let response = self.client.post(self.url("/superheroes")).json(data).send().await?;
        decode(response).await
    }

    async fn update_superhero(&self, id: &str, patch: &SuperheroPatch) -> ClientResult<SuperheroWithImages> {
        let response = self.client.patch(self.hero_url(id)).json(patch).send().await?;
        decode(response).await
    }

    async fn delete_superhero(&self, id: &str) -> ClientResult<Superhero> {
        let response = self.client.delete(self.hero_url(id)).send().await?;
        decode(response).await
    }

    async fn upload_image(&self, file: ImageFile) -> ClientResult<String> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(self.url("/upload")).multipart(form).send().await?;
        let body: UploadResponse = decode(response).await?;
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{router, AppState};
    use crate::config::AppConfig;
    use crate::heroes::{FieldChanges, Patch};
    use crate::storage::LocalStorage;
    use bytes::Bytes;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Serve the real router on a loopback port.
    async fn spawn_server() -> (TempDir, HttpSuperheroApi) {
        let dir = TempDir::new().unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let data_dir = dir.path().display().to_string();
        let config = AppConfig::from_lookup(|key| match key {
            "SUPERHERO_DATA_DIR" => Some(data_dir.clone()),
            "SUPERHERO_BIND_ADDR" => Some(addr.to_string()),
            _ => None,
        });
        let db = crate::db::init_database(&config.db_path()).await.unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path().join("blobs")));
        let state = Arc::new(AppState::new(Arc::new(db), storage, &config));
        let app = router(state, config.max_upload_bytes);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (dir, HttpSuperheroApi::new(format!("http://{}/", addr)).unwrap())
    }

    fn batman() -> NewSuperhero {
        NewSuperhero {
            nickname: "Batman".to_string(),
            real_name: "Bruce Wayne".to_string(),
            origin_description: "Orphaned in Crime Alley.".to_string(),
            superpowers: vec!["Detective skills".to_string()],
            catch_phrase: "I am vengeance".to_string(),
            images: Some(vec!["http://example.com/b1.jpg".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_round_trip_against_server() {
        let (_dir, api) = spawn_server().await;

        let created = api.create_superhero(&batman()).await.unwrap();
        assert_eq!(created.hero.nickname, "Batman");
        assert_eq!(created.image_urls(), vec!["http://example.com/b1.jpg"]);

        let page = api.fetch_superheroes(1, 5).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id(), created.id());

        let patch = SuperheroPatch {
            fields: FieldChanges {
                catch_phrase: Patch::Present("I am the night".to_string()),
                ..Default::default()
            },
            images: Patch::Present(vec![]),
        };
        let updated = api.update_superhero(created.id(), &patch).await.unwrap();
        assert_eq!(updated.hero.catch_phrase, "I am the night");
        assert!(updated.images.is_empty());
        assert_eq!(api.fetch_superhero(created.id()).await.unwrap(), updated);

        let deleted = api.delete_superhero(created.id()).await.unwrap();
        assert_eq!(deleted.id, created.hero.id);
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let (_dir, api) = spawn_server().await;

        let err = api.fetch_superhero("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Superhero not found");
        assert_eq!(err.status(), Some(404));

        let mut invalid = batman();
        invalid.superpowers.clear();
        let err = api.create_superhero(&invalid).await.unwrap_err();
        assert_eq!(err.to_string(), "superpowers should not be empty");
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_upload_image() {
        let (_dir, api) = spawn_server().await;

        let url = api
            .upload_image(ImageFile {
                file_name: "cowl.gif".to_string(),
                content_type: "image/gif".to_string(),
                bytes: Bytes::from_static(b"GIF89a\x01\0\x01\0"),
            })
            .await
            .unwrap();
        assert!(url.ends_with("_cowl.gif"));

        let err = api
            .upload_image(ImageFile {
                file_name: "notes.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: Bytes::from_static(b"hello"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only image files are allowed");
    }
}
