//! Favorites/comments encoding inside a Drive file description.
//!
//! Layout: `<original text>\n___METADATA___\n<json>`. Text before the marker is
//! the human-written description and is preserved (trimmed) on every write.

use band_hub_types::{Comment, Favorite};
use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel separating the original description from the JSON payload.
///
/// Assumed never to occur in ordinary description text; not enforced.
pub const MARKER: &str = "___METADATA___";

/// Decoded view of a description field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub original_description: String,
    pub favorites: Vec<Favorite>,
    pub comments: Vec<Comment>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    favorites: &'a [Favorite],
    comments: &'a [Comment],
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default, deserialize_with = "null_as_empty")]
    favorites: Vec<Favorite>,
    #[serde(default, deserialize_with = "null_as_empty")]
    comments: Vec<Comment>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Build the description text for the given triple.
pub fn encode_description(
    original_description: &str,
    favorites: &[Favorite],
    comments: &[Comment],
) -> String {
    let payload = PayloadRef {
        favorites,
        comments,
    };
    // Plain structs of strings and integers cannot fail to serialize.
    let json = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    format!("{}\n{MARKER}\n{json}", original_description.trim())
}

/// Decode a description field.
///
/// Never fails: a missing field or text without the marker is "no metadata
/// yet", and an unparsable payload degrades to empty lists with a warning.
pub fn decode_description(description: Option<&str>) -> FileMetadata {
    let Some(description) = description.filter(|d| !d.is_empty()) else {
        return FileMetadata::default();
    };
    let Some((before, after)) = description.split_once(MARKER) else {
        return FileMetadata {
            original_description: description.to_string(),
            ..FileMetadata::default()
        };
    };
    let original_description = before.trim().to_string();
    match serde_json::from_str::<Payload>(after.trim()) {
        Ok(payload) => FileMetadata {
            original_description,
            favorites: payload.favorites,
            comments: payload.comments,
        },
        Err(err) => {
            tracing::warn!(error = %err, "metadata payload unreadable; treating as empty");
            FileMetadata {
                original_description,
                ..FileMetadata::default()
            }
        }
    }
}

impl FileMetadata {
    /// Encode this metadata back into description text.
    pub fn encode(&self) -> String {
        encode_description(&self.original_description, &self.favorites, &self.comments)
    }

    /// Whether `email` has favorited the file.
    pub fn is_favorited_by(&self, email: &str) -> bool {
        self.favorites.iter().any(|fav| fav.user_email == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fav(email: &str, ts: i64) -> Favorite {
        Favorite {
            user_email: email.to_string(),
            user_name: email.split('@').next().unwrap_or_default().to_string(),
            timestamp_ms: ts,
        }
    }

    fn comment(id: &str, text: &str, email: &str) -> Comment {
        Comment {
            id: id.to_string(),
            text: text.to_string(),
            user_email: email.to_string(),
            user_name: "Sam".to_string(),
            timestamp_ms: 1_700_000_000_123,
        }
    }

    #[test]
    fn round_trip_trims_original_description() {
        let favorites = vec![fav("a@band.test", 1), fav("b@band.test", 2)];
        let comments = vec![
            comment("c1", "tight groove", "a@band.test"),
            comment("c2", "bridge \"drags\"\nafter 2:10", "b@band.test"),
        ];
        let encoded = encode_description("  Rehearsal take \n", &favorites, &comments);
        let decoded = decode_description(Some(&encoded));
        assert_eq!(decoded.original_description, "Rehearsal take");
        assert_eq!(decoded.favorites, favorites);
        assert_eq!(decoded.comments, comments);
    }

    #[test]
    fn round_trip_with_empty_everything() {
        let encoded = encode_description("", &[], &[]);
        assert_eq!(encoded, format!("\n{MARKER}\n{{\"favorites\":[],\"comments\":[]}}"));
        assert_eq!(decode_description(Some(&encoded)), FileMetadata::default());
    }

    #[test]
    fn text_without_marker_is_kept_verbatim() {
        let text = "  Recorded on 3/1/2024. Quality: lossless  ";
        let decoded = decode_description(Some(text));
        assert_eq!(decoded.original_description, text);
        assert!(decoded.favorites.is_empty());
        assert!(decoded.comments.is_empty());
    }

    #[test]
    fn missing_or_empty_field_is_empty_metadata() {
        assert_eq!(decode_description(None), FileMetadata::default());
        assert_eq!(decode_description(Some("")), FileMetadata::default());
    }

    #[test]
    fn invalid_json_keeps_text_before_marker() {
        let text = format!("Gig at the Vault\n{MARKER}\n{{not json");
        let decoded = decode_description(Some(&text));
        assert_eq!(decoded.original_description, "Gig at the Vault");
        assert!(decoded.favorites.is_empty());
        assert!(decoded.comments.is_empty());
    }

    #[test]
    fn payload_missing_lists_defaults_to_empty() {
        let text = format!("Demo\n{MARKER}\n{{\"favorites\":[{{\"userEmail\":\"a@band.test\",\"userName\":\"A\",\"timestamp\":5}}]}}");
        let decoded = decode_description(Some(&text));
        assert_eq!(decoded.favorites, vec![Favorite {
            user_email: "a@band.test".to_string(),
            user_name: "A".to_string(),
            timestamp_ms: 5,
        }]);
        assert!(decoded.comments.is_empty());
    }

    #[test]
    fn web_client_payload_without_names_or_lists_decodes() {
        let text = format!(
            "Demo\n{MARKER}\n{}",
            r#"{"favorites":[{"userEmail":"a@band.test","timestamp":1}],"comments":[{"id":"1700000000000","text":"bridge drags","userEmail":"b@band.test","userName":"Bo","timestamp":2}]}"#
        );
        let decoded = decode_description(Some(&text));
        assert_eq!(decoded.original_description, "Demo");
        assert_eq!(decoded.favorites.len(), 1);
        assert_eq!(decoded.favorites[0].user_email, "a@band.test");
        assert_eq!(decoded.favorites[0].user_name, "");
        assert_eq!(decoded.comments.len(), 1);
        assert_eq!(decoded.comments[0].text, "bridge drags");

        let nulls = format!("Demo\n{MARKER}\n{}", r#"{"favorites":null,"comments":null}"#);
        let decoded = decode_description(Some(&nulls));
        assert_eq!(decoded.original_description, "Demo");
        assert!(decoded.favorites.is_empty());
        assert!(decoded.comments.is_empty());
    }

    #[test]
    fn reencoding_degraded_field_drops_broken_payload() {
        let text = format!("Demo\n{MARKER}\n[broken");
        let repaired = decode_description(Some(&text)).encode();
        let decoded = decode_description(Some(&repaired));
        assert_eq!(decoded.original_description, "Demo");
        assert_eq!(repaired.matches(MARKER).count(), 1);
    }

    #[test]
    fn is_favorited_by_matches_email() {
        let meta = FileMetadata {
            favorites: vec![fav("a@band.test", 1)],
            ..FileMetadata::default()
        };
        assert!(meta.is_favorited_by("a@band.test"));
        assert!(!meta.is_favorited_by("b@band.test"));
    }
}
