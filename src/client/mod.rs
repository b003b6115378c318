//! Client side: typed remote API over HTTP plus the request store UIs bind to.

mod api;
mod http;
mod store;

pub use api::{ClientError, ClientResult, ImageFile, SuperheroApi};
pub use http::HttpSuperheroApi;
pub use store::{LoadingFlags, Operation, StoreEvent, StoreState, SuperheroStore};
