//! Favorite/comment mutations on top of a single remote text field.
//!
//! Every mutation is read-modify-write against the remote field with no
//! concurrency token: two members editing the same file inside one window can
//! lose an update (last writer wins).

use band_hub_types::{Comment, Favorite, UserIdentity};
use uuid::Uuid;

use crate::clock::now_ms;
use crate::error::RemoteError;
use crate::metadata::codec::{FileMetadata, decode_description};

/// Accessor for the remote free-text field that carries encoded metadata.
pub trait MetadataField {
    /// Fetch the field; `None` when the file has no value for it.
    fn get_field(&self, file_id: &str) -> Result<Option<String>, RemoteError>;
    /// Overwrite the field.
    fn set_field(&self, file_id: &str, text: &str) -> Result<(), RemoteError>;
}

impl<T: MetadataField + ?Sized> MetadataField for &T {
    fn get_field(&self, file_id: &str) -> Result<Option<String>, RemoteError> {
        (**self).get_field(file_id)
    }

    fn set_field(&self, file_id: &str, text: &str) -> Result<(), RemoteError> {
        (**self).set_field(file_id, text)
    }
}

/// Favorites and comments for remote files, keyed by file id.
pub struct MetadataStore<F> {
    field: F,
}

impl<F: MetadataField> MetadataStore<F> {
    pub fn new(field: F) -> Self {
        Self { field }
    }

    /// Access the underlying field accessor.
    pub fn field(&self) -> &F {
        &self.field
    }

    /// Fetch and decode the metadata for a file.
    pub fn read_metadata(&self, file_id: &str) -> Result<FileMetadata, RemoteError> {
        let raw = self.field.get_field(file_id)?;
        Ok(decode_description(raw.as_deref()))
    }

    pub fn favorites(&self, file_id: &str) -> Result<Vec<Favorite>, RemoteError> {
        Ok(self.read_metadata(file_id)?.favorites)
    }

    pub fn comments(&self, file_id: &str) -> Result<Vec<Comment>, RemoteError> {
        Ok(self.read_metadata(file_id)?.comments)
    }

    /// Add the user's favorite, or remove it if already present.
    ///
    /// Applying it twice with no interleaving write restores the prior list.
    pub fn toggle_favorite(
        &self,
        file_id: &str,
        user: &UserIdentity,
    ) -> Result<Vec<Favorite>, RemoteError> {
        let mut meta = self.read_metadata(file_id)?;
        if user.email.trim().is_empty() {
            tracing::debug!(file_id, "favorite toggle without user email ignored");
            return Ok(meta.favorites);
        }
        if let Some(idx) = meta
            .favorites
            .iter()
            .position(|fav| fav.user_email == user.email)
        {
            meta.favorites.remove(idx);
        } else {
            meta.favorites.push(Favorite {
                user_email: user.email.clone(),
                user_name: user.name.clone(),
                timestamp_ms: now_ms(),
            });
        }
        self.write(file_id, &meta)?;
        tracing::info!(
            file_id,
            user = %user.email,
            favorites = meta.favorites.len(),
            "favorite toggled"
        );
        Ok(meta.favorites)
    }

    /// Append a comment authored by `user`.
    ///
    /// Blank text is ignored and the current list is returned unchanged.
    pub fn add_comment(
        &self,
        file_id: &str,
        user: &UserIdentity,
        text: &str,
    ) -> Result<Vec<Comment>, RemoteError> {
        let mut meta = self.read_metadata(file_id)?;
        if text.trim().is_empty() {
            tracing::debug!(file_id, "blank comment ignored");
            return Ok(meta.comments);
        }
        let comment = Comment {
            id: new_comment_id(),
            text: text.to_string(),
            user_email: user.email.clone(),
            user_name: user.name.clone(),
            timestamp_ms: now_ms(),
        };
        let comment_id = comment.id.clone();
        meta.comments.push(comment);
        self.write(file_id, &meta)?;
        tracing::info!(file_id, comment_id = %comment_id, user = %user.email, "comment added");
        Ok(meta.comments)
    }

    /// Delete a comment if `user_email` is its author.
    ///
    /// Unknown ids and other members' comments are left untouched without a
    /// write.
    pub fn delete_comment(
        &self,
        file_id: &str,
        comment_id: &str,
        user_email: &str,
    ) -> Result<Vec<Comment>, RemoteError> {
        let mut meta = self.read_metadata(file_id)?;
        let Some(idx) = meta.comments.iter().position(|c| c.id == comment_id) else {
            tracing::debug!(file_id, comment_id, "comment not found");
            return Ok(meta.comments);
        };
        if meta.comments[idx].user_email != user_email {
            tracing::debug!(
                file_id,
                comment_id,
                user = %user_email,
                "comment delete by non-author ignored"
            );
            return Ok(meta.comments);
        }
        meta.comments.remove(idx);
        self.write(file_id, &meta)?;
        tracing::info!(file_id, comment_id, "comment deleted");
        Ok(meta.comments)
    }

    fn write(&self, file_id: &str, meta: &FileMetadata) -> Result<(), RemoteError> {
        self.field.set_field(file_id, &meta.encode())
    }
}

fn new_comment_id() -> String {
    Uuid::now_v7().to_string()
}
