//! Typed decode/encode boundary between persisted strings and values.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StoreError, StoreResult};

/// Why a persisted payload produced no usable value.
#[derive(Debug)]
pub enum DecodeError {
    /// Nothing is stored under the key.
    Absent,
    /// The payload is not valid JSON or has the wrong shape.
    Malformed(serde_json::Error),
}

/// Decode a persisted payload into `T`.
pub fn decode<T: DeserializeOwned>(raw: Option<&str>) -> Result<T, DecodeError> {
    let raw = raw.ok_or(DecodeError::Absent)?;
    serde_json::from_str(raw).map_err(DecodeError::Malformed)
}

/// Produce the canonical persisted form of `value`.
pub fn encode<T: Serialize>(key: &str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_absent_from_malformed() {
        assert!(matches!(decode::<Vec<String>>(None), Err(DecodeError::Absent)));
        assert!(matches!(
            decode::<Vec<String>>(Some("{not json")),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode::<Vec<String>>(Some("42")),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(
            decode::<Vec<String>>(Some(r#"["a","b"]"#)).ok(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
