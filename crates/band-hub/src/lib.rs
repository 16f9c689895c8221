pub mod calendar;
pub mod clock;
pub mod config;
pub mod drive;
pub mod error;
pub mod http;
pub mod metadata;
pub mod playback;
pub mod quality;
pub mod recording_store;

pub use error::{ControlError, RemoteError};
pub use http::AccessToken;
