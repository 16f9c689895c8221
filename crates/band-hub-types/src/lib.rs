use serde::{Deserialize, Serialize};

/// Band member performing a favorite/comment mutation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    /// Account email; the identity key for favorites and comment ownership.
    pub email: String,
    /// Display name stored alongside favorites/comments.
    pub name: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// One member's favorite mark on a shared recording.
///
/// Serialized with the camelCase keys already present in Drive descriptions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_email: String,
    /// Omitted by the web client when the account has no display name.
    #[serde(default)]
    pub user_name: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp", default)]
    pub timestamp_ms: i64,
}

/// A comment left on a shared recording.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Creation-time derived unique token.
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Author email; only the author may delete the comment.
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp", default)]
    pub timestamp_ms: i64,
}

/// File entry returned by the Drive `files` endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub mime_type: Option<String>,
    /// Byte size; Drive encodes it as a decimal string.
    pub size: Option<String>,
    /// RFC 3339 creation time.
    pub created_time: Option<String>,
    /// RFC 3339 last modification time.
    pub modified_time: Option<String>,
    /// Free-text description; also carries encoded favorites/comments.
    pub description: Option<String>,
    pub web_view_link: Option<String>,
    pub web_content_link: Option<String>,
    pub thumbnail_link: Option<String>,
}

impl DriveFile {
    /// Parsed byte size, if Drive reported one.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Page of files returned by `files.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Capabilities Drive reports for the caller on a folder.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderCapabilities {
    #[serde(default)]
    pub can_add_children: bool,
    #[serde(default)]
    pub can_edit: bool,
}

/// Folder lookup result (`fields=id,name,capabilities`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFolder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capabilities: Option<FolderCapabilities>,
}

/// Result of a completed recording upload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
    pub file_name: String,
    pub web_view_link: String,
    pub web_content_link: Option<String>,
}

/// Start or end of a calendar event.
///
/// All-day events carry `date`; timed events carry `date_time`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// Calendar date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Rehearsal/gig event from the band calendar.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// Page of events returned by `events.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalendarEventList {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}

/// Calendar visible to the caller (`calendarList.list`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub access_role: Option<String>,
}

/// Page of calendars returned by `calendarList.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalendarList {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
}
