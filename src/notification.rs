//! S3 event notification decoding
//!
//! Each inbound message body wraps an S3 event notification envelope. This
//! module unwraps that layer, extracts the (bucket, key) pairs, and
//! normalizes the transport-encoded object keys.

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WorkerError};

/// A reference to one stored object that should be thumbnailed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct S3EventEnvelope {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
struct S3EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Decode one raw message body into object references.
///
/// A body without a `Records` field is a valid non-storage-event message
/// (e.g. `s3:TestEvent`) and yields an empty sequence rather than an error.
pub fn decode_notification(body: &str) -> Result<Vec<ObjectRef>> {
    let envelope: S3EventEnvelope = serde_json::from_str(body)?;

    if envelope.records.is_empty() {
        debug!("Message carries no event records, skipping");
        return Ok(Vec::new());
    }

    envelope
        .records
        .into_iter()
        .map(|record| {
            Ok(ObjectRef {
                bucket: record.s3.bucket.name,
                key: normalize_key(&record.s3.object.key)?,
            })
        })
        .collect()
}

/// Normalize a transport-encoded object key.
///
/// The notifier encodes keys with percent-escapes plus `+` for space; this
/// exactly inverts that encoding. A mis-encoded key is rejected rather than
/// silently decoded into a wrong key.
pub fn normalize_key(raw: &str) -> Result<String> {
    let replaced = raw.replace('+', " ");
    validate_percent_escapes(&replaced)?;

    match urlencoding::decode(&replaced) {
        Ok(decoded) => Ok(decoded.into_owned()),
        Err(e) => Err(WorkerError::MalformedEnvelope(format!(
            "object key {raw:?} is not valid UTF-8 after decoding: {e}"
        ))),
    }
}

// urlencoding passes malformed escapes through verbatim, which would turn a
// mis-encoded key into a wrong one. Reject them up front.
fn validate_percent_escapes(key: &str) -> Result<()> {
    let bytes = key.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return Err(WorkerError::MalformedEnvelope(format!(
                    "object key {key:?} contains an invalid percent escape"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_body(bucket: &str, key: &str) -> String {
        serde_json::json!({
            "Records": [{
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key }
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_decode_single_record() {
        let refs = decode_notification(&event_body("src", "pics/cat.png")).unwrap();
        assert_eq!(
            refs,
            vec![ObjectRef {
                bucket: "src".to_string(),
                key: "pics/cat.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_records_field_is_inert() {
        let refs = decode_notification(r#"{"Event":"s3:TestEvent"}"#).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_empty_records_is_inert() {
        let refs = decode_notification(r#"{"Records":[]}"#).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = decode_notification("not json").unwrap_err();
        assert!(matches!(err, WorkerError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_record_missing_object_is_malformed() {
        let body = r#"{"Records":[{"s3":{"bucket":{"name":"src"}}}]}"#;
        let err = decode_notification(body).unwrap_err();
        assert!(matches!(err, WorkerError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_normalize_plus_and_escape() {
        assert_eq!(normalize_key("a+b%20c").unwrap(), "a b c");
    }

    #[test]
    fn test_normalize_round_trip() {
        let key = normalize_key("pics/summer+trip+%282024%29.png").unwrap();
        assert_eq!(key, "pics/summer trip (2024).png");

        // Re-encoding and normalizing again must recover the same key
        let encoded = urlencoding::encode(&key).into_owned();
        assert_eq!(normalize_key(&encoded).unwrap(), key);
    }

    #[test]
    fn test_dangling_escape_rejected() {
        assert!(matches!(
            normalize_key("cat%2"),
            Err(WorkerError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            normalize_key("cat%zz.png"),
            Err(WorkerError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(matches!(
            normalize_key("%FF%FE"),
            Err(WorkerError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_normalizes_keys() {
        let refs = decode_notification(&event_body("src", "my+photo%21.jpg")).unwrap();
        assert_eq!(refs[0].key, "my photo!.jpg");
    }
}
