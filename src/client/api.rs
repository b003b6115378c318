use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::heroes::{NewSuperhero, Paginated, Superhero, SuperheroPatch, SuperheroWithImages};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's message verbatim
    #[error("{message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A local file to upload
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Remote superhero API
#[async_trait]
pub trait SuperheroApi: Send + Sync {
    async fn fetch_superheroes(&self, page: u64, limit: u64) -> ClientResult<Paginated<SuperheroWithImages>>;

    async fn fetch_superhero(&self, id: &str) -> ClientResult<SuperheroWithImages>;

    async fn create_superhero(&self, data: &NewSuperhero) -> ClientResult<SuperheroWithImages>;

    async fn update_superhero(&self, id: &str, patch: &SuperheroPatch) -> ClientResult<SuperheroWithImages>;

    async fn delete_superhero(&self, id: &str) -> ClientResult<Superhero>;

    /// Upload an image and return its public url.
    async fn upload_image(&self, file: ImageFile) -> ClientResult<String>;
}

#[async_trait]
impl<T: SuperheroApi + ?Sized> SuperheroApi for Arc<T> {
    async fn fetch_superheroes(&self, page: u64, limit: u64) -> ClientResult<Paginated<SuperheroWithImages>> {
        (**self).fetch_superheroes(page, limit).await
    }

    async fn fetch_superhero(&self, id: &str) -> ClientResult<SuperheroWithImages> {
        (**self).fetch_superhero(id).await
    }

    async fn create_superhero(&self, data: &NewSuperhero) -> ClientResult<SuperheroWithImages> {
        (**self).create_superhero(data).await
    }

    async fn update_superhero(&self, id: &str, patch: &SuperheroPatch) -> ClientResult<SuperheroWithImages> {
        (**self).update_superhero(id, patch).await
    }

    async fn delete_superhero(&self, id: &str) -> ClientResult<Superhero> {
        (**self).delete_superhero(id).await
    }

    async fn upload_image(&self, file: ImageFile) -> ClientResult<String> {
        (**self).upload_image(file).await
    }
}
