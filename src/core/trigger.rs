use crate::utils::error::{EtlError, Result};
use percent_encoding::percent_decode_str;
use serde::Deserialize;

/// What the cleaning stage needs to know about one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningTrigger {
    pub source_bucket: String,
    pub source_key: String,
}

/// Accepted invocation payloads: an S3 object-created notification, or an
/// explicit `{source_bucket, source_key}` call from an orchestrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TriggerEvent {
    S3(S3Event),
    Direct(DirectTrigger),
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectTrigger {
    pub source_bucket: Option<String>,
    pub source_key: String,
}

impl TriggerEvent {
    pub fn from_json(payload: serde_json::Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| EtlError::InvalidTrigger {
            message: format!("unrecognised trigger payload: {}", e),
        })
    }

    /// Resolves the event to a single source object with a decoded key.
    ///
    /// Only the first record of an S3 notification is used; each invocation
    /// handles exactly one source key.
    pub fn into_trigger(self, default_bucket: Option<&str>) -> Result<CleaningTrigger> {
        let (bucket, raw_key) = match self {
            TriggerEvent::S3(event) => {
                let total = event.records.len();
                let record = event
                    .records
                    .into_iter()
                    .next()
                    .ok_or_else(|| EtlError::InvalidTrigger {
                        message: "S3 event contains no records".to_string(),
                    })?;
                if total > 1 {
                    tracing::warn!(
                        "⚠️ S3 event carries {} records, only the first is processed",
                        total
                    );
                }
                (Some(record.s3.bucket.name), record.s3.object.key)
            }
            TriggerEvent::Direct(direct) => (direct.source_bucket, direct.source_key),
        };

        let source_bucket = bucket
            .or_else(|| default_bucket.map(str::to_string))
            .ok_or_else(|| EtlError::InvalidTrigger {
                message: "trigger has no source bucket and none is configured".to_string(),
            })?;

        Ok(CleaningTrigger {
            source_bucket,
            source_key: decode_object_key(&raw_key)?,
        })
    }
}

/// Decodes a key the way S3 notifications encode it: `+` is a space and
/// `%XX` escapes are UTF-8 bytes.
pub fn decode_object_key(key: &str) -> Result<String> {
    let spaced = key.replace('+', " ");
    let decoded = percent_decode_str(&spaced)
        .decode_utf8()
        .map_err(|e| EtlError::InvalidTrigger {
            message: format!("object key '{}' is not valid UTF-8 once decoded: {}", key, e),
        })?;

    if decoded.is_empty() {
        return Err(EtlError::InvalidTrigger {
            message: "object key is empty".to_string(),
        });
    }

    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object_key() {
        assert_eq!(
            decode_object_key("raw/countries_data.json").unwrap(),
            "raw/countries_data.json"
        );
        assert_eq!(
            decode_object_key("raw/my+countries%282%29.json").unwrap(),
            "raw/my countries(2).json"
        );
        assert_eq!(decode_object_key("raw/caf%C3%A9.json").unwrap(), "raw/café.json");
        assert_eq!(decode_object_key("raw/a%2Bb.json").unwrap(), "raw/a+b.json");
        assert!(decode_object_key("raw/%FF.json").is_err());
        assert!(decode_object_key("").is_err());
    }

    #[test]
    fn test_s3_event_uses_first_record() {
        let payload = json!({
            "Records": [
                {"s3": {"bucket": {"name": "source-bucket"}, "object": {"key": "raw/countries+data.json", "size": 10}}},
                {"s3": {"bucket": {"name": "other"}, "object": {"key": "raw/ignored.json"}}}
            ]
        });

        let trigger = TriggerEvent::from_json(payload)
            .unwrap()
            .into_trigger(None)
            .unwrap();

        assert_eq!(
            trigger,
            CleaningTrigger {
                source_bucket: "source-bucket".to_string(),
                source_key: "raw/countries data.json".to_string(),
            }
        );
    }

    #[test]
    fn test_direct_trigger_falls_back_to_default_bucket() {
        let payload = json!({"source_key": "raw/countries_data.json"});

        let trigger = TriggerEvent::from_json(payload.clone())
            .unwrap()
            .into_trigger(Some("configured-bucket"))
            .unwrap();
        assert_eq!(trigger.source_bucket, "configured-bucket");

        let err = TriggerEvent::from_json(payload)
            .unwrap()
            .into_trigger(None)
            .unwrap_err();
        assert!(matches!(err, EtlError::InvalidTrigger { .. }));
    }

    #[test]
    fn test_empty_or_unknown_events_are_rejected() {
        let empty = TriggerEvent::from_json(json!({"Records": []})).unwrap();
        assert!(empty.into_trigger(Some("bucket")).is_err());

        assert!(TriggerEvent::from_json(json!({"foo": "bar"})).is_err());
    }
}
