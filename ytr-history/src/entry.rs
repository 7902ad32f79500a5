//! History entry model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One remembered video
///
/// `video_id` is the dedup key. Everything else the writer supplies is kept
/// verbatim in `fields` and flattened next to `videoId` when persisted:
///
/// ```json
/// { "videoId": "dQw4w9WgXcQ", "title": "...", "startSeconds": 30 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "videoId")]
    pub video_id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HistoryEntry {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            fields: Map::new(),
        }
    }

    /// Attach an opaque metadata field
    ///
    /// `videoId` is reserved for the dedup key and is ignored here.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "videoId" {
            self.fields.insert(key, value.into());
        }
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattened_layout() {
        let entry = HistoryEntry::new("abc")
            .with_field("title", "A song")
            .with_field("startSeconds", 12.5);

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({ "videoId": "abc", "title": "A song", "startSeconds": 12.5 })
        );
    }

    #[test]
    fn test_unknown_fields_survive_parse() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"videoId":"xyz","range":"10-20","plays":3}"#).unwrap();

        assert_eq!(entry.video_id, "xyz");
        assert_eq!(entry.field("range"), Some(&json!("10-20")));
        assert_eq!(entry.field("plays"), Some(&json!(3)));
        assert!(entry.field("videoId").is_none());
    }

    #[test]
    fn test_video_id_field_is_reserved() {
        let entry = HistoryEntry::new("real").with_field("videoId", "fake");
        assert_eq!(entry.video_id, "real");
        assert!(entry.fields.is_empty());
    }

    #[test]
    fn test_missing_video_id_rejected() {
        assert!(serde_json::from_str::<HistoryEntry>(r#"{"title":"x"}"#).is_err());
    }
}
