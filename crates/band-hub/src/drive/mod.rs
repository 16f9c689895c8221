//! Google Drive access: recordings folder, uploads, and the description field.

pub mod client;
pub mod filter;
pub mod upload;

pub use client::{DriveClient, RECORDINGS_FOLDER_NAME, has_drive_scope, web_view_link};
pub use filter::RecordingFilter;
pub use upload::{RecordingUpload, file_extension, format_duration};
