//! Drive v3 client for the band's recordings folder.

use std::io::Write;

use band_hub_types::{DriveFile, DriveFileList, DriveFolder, UploadedFile};
use serde::Deserialize;

use crate::config::GoogleEndpoints;
use crate::drive::upload::{RecordingUpload, multipart_body};
use crate::error::RemoteError;
use crate::http::{AccessToken, build_agent, check_response, read_json};
use crate::metadata::MetadataField;

/// Personal folder used when no shared folder is configured.
pub const RECORDINGS_FOLDER_NAME: &str = "Practice Recordings";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const LIST_FIELDS: &str = "files(id,name,mimeType,size,createdTime,modifiedTime,description,webViewLink,webContentLink,thumbnailLink)";

#[derive(Deserialize)]
struct DescriptionResponse {
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    #[serde(default)]
    name: String,
    web_content_link: Option<String>,
}

pub struct DriveClient {
    base_url: String,
    upload_base_url: String,
    token: AccessToken,
    agent: ureq::Agent,
}

impl DriveClient {
    pub fn new(token: AccessToken, endpoints: &GoogleEndpoints) -> Self {
        Self {
            base_url: endpoints.drive.clone(),
            upload_base_url: endpoints.drive_upload.clone(),
            token,
            agent: build_agent(endpoints.timeout),
        }
    }

    /// Read a file's description field.
    pub fn file_description(&self, file_id: &str) -> Result<Option<String>, RemoteError> {
        let url = format!("{}?fields=description", self.file_url(file_id));
        let resp = check_response(
            "read description",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let body: DescriptionResponse = read_json("read description", resp)?;
        Ok(body.description)
    }

    /// Overwrite a file's description field.
    pub fn set_file_description(&self, file_id: &str, description: &str) -> Result<(), RemoteError> {
        let url = self.file_url(file_id);
        check_response(
            "update description",
            self.agent
                .patch(&url)
                .header("Authorization", &self.token.bearer())
                .send_json(serde_json::json!({ "description": description })),
        )?;
        tracing::debug!(file_id, bytes = description.len(), "description updated");
        Ok(())
    }

    /// Check that the caller can see a folder.
    pub fn verify_folder(&self, folder_id: &str) -> Result<DriveFolder, RemoteError> {
        let url = format!("{}?fields=id,name,capabilities", self.file_url(folder_id));
        let resp = check_response(
            "verify folder",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        read_json("verify folder", resp)
    }

    /// Find a non-trashed folder by exact name.
    pub fn find_folder(&self, name: &str) -> Result<Option<DriveFile>, RemoteError> {
        let query = format!(
            "name='{}' and mimeType='{FOLDER_MIME_TYPE}' and trashed=false",
            escape_query_literal(name)
        );
        let url = format!(
            "{}/files?q={}&fields=files(id,name)",
            self.base_url,
            urlencoding::encode(&query)
        );
        let resp = check_response(
            "find folder",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let list: DriveFileList = read_json("find folder", resp)?;
        Ok(list.files.into_iter().next())
    }

    pub fn create_folder(&self, name: &str) -> Result<DriveFile, RemoteError> {
        let url = format!("{}/files", self.base_url);
        let resp = check_response(
            "create folder",
            self.agent
                .post(&url)
                .header("Authorization", &self.token.bearer())
                .send_json(serde_json::json!({ "name": name, "mimeType": FOLDER_MIME_TYPE })),
        )?;
        let file: DriveFile = read_json("create folder", resp)?;
        tracing::info!(folder_id = %file.id, name, "created recordings folder");
        Ok(file)
    }

    /// Folder that recordings live in.
    ///
    /// A configured shared folder must be visible to the caller; otherwise the
    /// personal "Practice Recordings" folder is found or created.
    pub fn resolve_recordings_folder(
        &self,
        shared_folder_id: Option<&str>,
    ) -> Result<String, RemoteError> {
        if let Some(folder_id) = shared_folder_id {
            let folder = self.verify_folder(folder_id)?;
            tracing::debug!(folder_id = %folder.id, name = %folder.name, "shared folder accessible");
            return Ok(folder.id);
        }
        if let Some(existing) = self.find_folder(RECORDINGS_FOLDER_NAME)? {
            return Ok(existing.id);
        }
        Ok(self.create_folder(RECORDINGS_FOLDER_NAME)?.id)
    }

    /// Non-trashed files in a folder, most recently modified first.
    pub fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, RemoteError> {
        let url = list_folder_url(&self.base_url, folder_id);
        let resp = check_response(
            "list folder",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let list: DriveFileList = read_json("list folder", resp)?;
        tracing::info!(folder_id, count = list.files.len(), "listed recordings");
        Ok(list.files)
    }

    /// Upload a recording into `folder_id` with a multipart request.
    pub fn upload_recording(
        &self,
        folder_id: &str,
        upload: &RecordingUpload,
    ) -> Result<UploadedFile, RemoteError> {
        let url = format!("{}/files?uploadType=multipart", self.upload_base_url);
        let body = multipart_body(folder_id, upload);
        tracing::info!(
            folder_id,
            name = %upload.name,
            bytes = upload.audio.len(),
            "uploading recording"
        );
        let resp = check_response(
            "upload recording",
            self.agent
                .post(&url)
                .header("Authorization", &self.token.bearer())
                .header("Content-Type", &body.content_type)
                .send(&body.bytes[..]),
        )?;
        let created: CreatedFile = read_json("upload recording", resp)?;
        Ok(UploadedFile {
            web_view_link: web_view_link(&created.id),
            file_id: created.id,
            file_name: created.name,
            web_content_link: created.web_content_link,
        })
    }

    pub fn delete_file(&self, file_id: &str) -> Result<(), RemoteError> {
        let url = self.file_url(file_id);
        check_response(
            "delete file",
            self.agent
                .delete(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        tracing::info!(file_id, "deleted drive file");
        Ok(())
    }

    /// Stream a file's content into `out`. Returns bytes written.
    pub fn download_file(&self, file_id: &str, out: &mut impl Write) -> Result<u64, RemoteError> {
        let url = format!("{}?alt=media", self.file_url(file_id));
        let resp = check_response(
            "download file",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let mut reader = resp.into_body().into_reader();
        std::io::copy(&mut reader, out).map_err(|err| RemoteError::InvalidResponse {
            operation: "download file",
            message: err.to_string(),
        })
    }

    /// Direct media URL with the token embedded, for players that cannot set headers.
    pub fn stream_url(&self, file_id: &str) -> String {
        format!(
            "{}?alt=media&access_token={}",
            self.file_url(file_id),
            urlencoding::encode(self.token.secret())
        )
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base_url, urlencoding::encode(file_id))
    }
}

impl MetadataField for DriveClient {
    fn get_field(&self, file_id: &str) -> Result<Option<String>, RemoteError> {
        self.file_description(file_id)
    }

    fn set_field(&self, file_id: &str, text: &str) -> Result<(), RemoteError> {
        self.set_file_description(file_id, text)
    }
}

pub fn web_view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

/// Whether an OAuth scope string grants Drive access.
pub fn has_drive_scope(scope: &str) -> bool {
    scope
        .split_whitespace()
        .any(|s| s.contains("/auth/drive"))
}

fn list_folder_url(base_url: &str, folder_id: &str) -> String {
    let query = format!("'{}' in parents and trashed=false", escape_query_literal(folder_id));
    format!(
        "{}/files?q={}&fields={}&orderBy={}",
        base_url,
        urlencoding::encode(&query),
        urlencoding::encode(LIST_FIELDS),
        urlencoding::encode("modifiedTime desc")
    )
}

/// Escape a value for a single-quoted Drive query literal.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
