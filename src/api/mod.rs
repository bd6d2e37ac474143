mod client;
mod error;
mod types;

pub use client::PhotoApi;
pub use error::ApiError;
pub use types::{PageResult, PhotoId, PhotoRecord};
