//! Multipart upload body and naming helpers for recordings.

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

const BOUNDARY: &str = "-------314159265358979323846";

/// A recording ready to be uploaded to Drive.
#[derive(Clone, Debug)]
pub struct RecordingUpload {
    /// Base name without extension.
    pub name: String,
    pub mime_type: String,
    pub audio: Vec<u8>,
    pub duration_secs: f64,
    /// Recording time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Quality preset id, if known.
    pub quality: Option<String>,
}

impl RecordingUpload {
    /// Drive file name, `<name>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, file_extension(&self.mime_type))
    }

    /// Description written at upload time, before any favorites/comments.
    pub fn description(&self) -> String {
        format!(
            "Recorded on {}. Quality: {}, Duration: {}",
            format_recorded_at(self.timestamp_ms),
            self.quality.as_deref().unwrap_or("standard"),
            format_duration(self.duration_secs)
        )
    }
}

#[derive(Serialize)]
struct UploadMetadata<'a> {
    name: String,
    parents: [&'a str; 1],
    description: String,
}

/// `multipart/related` body: JSON metadata part, then the media part.
pub(crate) struct MultipartBody {
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

pub(crate) fn multipart_body(folder_id: &str, upload: &RecordingUpload) -> MultipartBody {
    let metadata = UploadMetadata {
        name: upload.file_name(),
        parents: [folder_id],
        description: upload.description(),
    };
    let metadata_json = serde_json::to_string(&metadata).unwrap_or_else(|_| "{}".to_string());
    let delimiter = format!("\r\n--{BOUNDARY}\r\n");
    let close = format!("\r\n--{BOUNDARY}--");

    let head = format!(
        "{delimiter}Content-Type: application/json; charset=UTF-8\r\n\r\n{metadata_json}{delimiter}Content-Type: {}\r\n\r\n",
        upload.mime_type
    );
    let mut bytes = Vec::with_capacity(head.len() + upload.audio.len() + close.len());
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(&upload.audio);
    bytes.extend_from_slice(close.as_bytes());

    MultipartBody {
        content_type: format!("multipart/related; boundary={BOUNDARY}"),
        bytes,
    }
}

/// File extension for a recorder MIME type.
pub fn file_extension(mime_type: &str) -> &'static str {
    if mime_type.contains("webm") {
        "webm"
    } else if mime_type.contains("mp4") {
        "mp4"
    } else if mime_type.contains("mpeg") {
        "mp3"
    } else {
        "audio"
    }
}

/// `3725` -> `1h 2m 5s`, `125` -> `2m 5s`, `5` -> `5s`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hrs = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hrs > 0 {
        format!("{hrs}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn format_recorded_at(timestamp_ms: i64) -> String {
    let Ok(at) = OffsetDateTime::from_unix_timestamp_nanos(timestamp_ms as i128 * 1_000_000)
    else {
        return "unknown date".to_string();
    };
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute] UTC"
    ))
    .unwrap_or_else(|_| "unknown date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> RecordingUpload {
        RecordingUpload {
            name: "Night Drive - Take 3".to_string(),
            mime_type: "audio/webm;codecs=opus".to_string(),
            audio: vec![0xde, 0xad, 0xbe, 0xef],
            duration_secs: 185.0,
            timestamp_ms: 1_709_294_400_000,
            quality: Some("lossless".to_string()),
        }
    }

    #[test]
    fn extension_follows_mime_type() {
        assert_eq!(file_extension("audio/webm;codecs=opus"), "webm");
        assert_eq!(file_extension("audio/mp4"), "mp4");
        assert_eq!(file_extension("audio/mpeg"), "mp3");
        assert_eq!(file_extension("audio/wav"), "audio");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(5.0), "5s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
        assert_eq!(format_duration(f64::NAN), "0s");
    }

    #[test]
    fn description_mentions_quality_and_duration() {
        let upload = upload();
        assert_eq!(upload.file_name(), "Night Drive - Take 3.webm");
        assert_eq!(
            upload.description(),
            "Recorded on 2024-03-01 12:00 UTC. Quality: lossless, Duration: 3m 5s"
        );
    }

    #[test]
    fn multipart_body_wraps_metadata_and_audio() {
        let body = multipart_body("folder-9", &upload());
        assert_eq!(
            body.content_type,
            "multipart/related; boundary=-------314159265358979323846"
        );
        let text = String::from_utf8_lossy(&body.bytes);
        assert!(text.starts_with("\r\n---------314159265358979323846\r\nContent-Type: application/json"));
        assert!(text.contains("\"parents\":[\"folder-9\"]"));
        assert!(text.contains("\"name\":\"Night Drive - Take 3.webm\""));
        assert!(text.contains("Content-Type: audio/webm;codecs=opus\r\n\r\n"));
        assert!(text.ends_with("\r\n---------314159265358979323846--"));
        let audio_at = body
            .bytes
            .windows(4)
            .position(|w| w == [0xde, 0xad, 0xbe, 0xef])
            .expect("audio bytes present");
        assert!(audio_at > 0);
    }
}
