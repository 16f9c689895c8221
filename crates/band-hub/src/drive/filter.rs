//! Browse filters for the recordings folder listing.

use band_hub_types::DriveFile;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::metadata::FileMetadata;

/// All set criteria must match; an empty filter keeps everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingFilter {
    /// Case-insensitive substring of the file name.
    pub search: Option<String>,
    /// Keep only files this member marked as favorite.
    pub favorited_by: Option<String>,
    /// Keep only files last modified on this UTC day.
    pub modified_on: Option<Date>,
}

impl RecordingFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.favorited_by.is_none() && self.modified_on.is_none()
    }

    pub fn matches(&self, file: &DriveFile, metadata: &FileMetadata) -> bool {
        if let Some(search) = self.search.as_deref() {
            if !file.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(email) = self.favorited_by.as_deref() {
            if !metadata.is_favorited_by(email) {
                return false;
            }
        }
        if let Some(day) = self.modified_on {
            if modified_day(file) != Some(day) {
                return false;
            }
        }
        true
    }
}

/// UTC day of `modifiedTime`; `None` when absent or unparseable.
pub fn modified_day(file: &DriveFile) -> Option<Date> {
    let at = OffsetDateTime::parse(file.modified_time.as_deref()?, &Rfc3339).ok()?;
    Some(at.to_offset(UtcOffset::UTC).date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use band_hub_types::Favorite;
    use time::macros::date;

    fn file(name: &str, modified: Option<&str>) -> DriveFile {
        DriveFile {
            id: format!("id-{name}"),
            name: name.to_string(),
            modified_time: modified.map(str::to_string),
            ..DriveFile::default()
        }
    }

    fn favorited_by(email: &str) -> FileMetadata {
        FileMetadata {
            favorites: vec![Favorite {
                user_email: email.to_string(),
                user_name: "Member".to_string(),
                timestamp_ms: 1,
            }],
            ..FileMetadata::default()
        }
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = RecordingFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&file("anything", None), &FileMetadata::default()));
    }

    #[test]
    fn search_ignores_case() {
        let filter = RecordingFilter {
            search: Some("bridge".to_string()),
            ..RecordingFilter::default()
        };
        let none = FileMetadata::default();
        assert!(filter.matches(&file("Take 3 - BRIDGE.webm", None), &none));
        assert!(!filter.matches(&file("Take 4 - chorus.webm", None), &none));
    }

    #[test]
    fn favorites_filter_matches_member_email() {
        let filter = RecordingFilter {
            favorited_by: Some("a@band.test".to_string()),
            ..RecordingFilter::default()
        };
        let take = file("take.webm", None);
        assert!(filter.matches(&take, &favorited_by("a@band.test")));
        assert!(!filter.matches(&take, &favorited_by("b@band.test")));
        assert!(!filter.matches(&take, &FileMetadata::default()));
    }

    #[test]
    fn date_filter_uses_utc_modified_day() {
        let filter = RecordingFilter {
            modified_on: Some(date!(2024 - 03 - 01)),
            ..RecordingFilter::default()
        };
        let none = FileMetadata::default();
        assert!(filter.matches(&file("a", Some("2024-03-01T23:30:00.000Z")), &none));
        assert!(filter.matches(&file("b", Some("2024-03-02T01:00:00+02:00")), &none));
        assert!(!filter.matches(&file("c", Some("2024-03-02T00:00:01Z")), &none));
        assert!(!filter.matches(&file("d", None), &none));
    }

    #[test]
    fn criteria_combine() {
        let filter = RecordingFilter {
            search: Some("take".to_string()),
            favorited_by: Some("a@band.test".to_string()),
            modified_on: Some(date!(2024 - 03 - 01)),
        };
        let hit = file("Take 1", Some("2024-03-01T10:00:00Z"));
        let wrong_day = file("Take 2", Some("2024-02-28T10:00:00Z"));
        assert!(filter.matches(&hit, &favorited_by("a@band.test")));
        assert!(!filter.matches(&wrong_day, &favorited_by("a@band.test")));
        assert!(!filter.matches(&hit, &FileMetadata::default()));
    }
}
