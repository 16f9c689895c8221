//! Shared favorites/comments stored in remote file descriptions.

pub mod codec;
pub mod store;

pub use codec::{FileMetadata, MARKER, decode_description, encode_description};
pub use store::{MetadataField, MetadataStore};
