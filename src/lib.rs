//! Superhero catalog: HTTP server, persistence, image uploads and a client-side store.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod heroes;
pub mod storage;
pub mod upload;
