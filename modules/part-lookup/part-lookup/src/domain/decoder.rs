//! Decoding of part search responses.

use part_lookup_sdk::FoundRecord;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Records and service errors carried by one response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedResult {
    pub records: Vec<FoundRecord>,
    pub errors: Vec<String>,
}

/// The body is not a well-formed search response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    Json(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("{field} has an unexpected shape")]
    UnexpectedShape { field: &'static str },

    #[error("part #{index} is invalid: {reason}")]
    InvalidPart { index: usize, reason: String },
}

/// Decode a raw search response.
///
/// A missing or null `SearchResults.Parts` decodes to no records. Every part
/// must be an object with a string `MouserPartNumber`.
///
/// # Errors
/// Returns [`DecodeError`] when the body is not JSON, not an object, or the
/// parts list is malformed.
pub fn decode(raw: &[u8]) -> Result<DecodedResult, DecodeError> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| DecodeError::Json(e.to_string()))?;
    let Value::Object(body) = &value else {
        return Err(DecodeError::NotAnObject);
    };

    let parts = match body.get("SearchResults") {
        None | Some(Value::Null) => None,
        Some(Value::Object(results)) => match results.get("Parts") {
            None | Some(Value::Null) => None,
            Some(Value::Array(parts)) => Some(parts),
            Some(_) => {
                return Err(DecodeError::UnexpectedShape {
                    field: "SearchResults.Parts",
                });
            }
        },
        Some(_) => {
            return Err(DecodeError::UnexpectedShape {
                field: "SearchResults",
            });
        }
    };

    let records = parts
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(index, part)| {
            FoundRecord::deserialize(part).map_err(|e| DecodeError::InvalidPart {
                index,
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedResult {
        records,
        errors: extract_service_errors(&value),
    })
}

/// Collect the service error messages of a response.
///
/// `Errors` may hold strings or objects. Objects contribute their `Message`,
/// then their `Code`, then their compact JSON text. A missing or null
/// `Errors`, an empty array or object, a blank string and `false` yield no
/// messages.
#[must_use]
pub fn extract_service_errors(response: &Value) -> Vec<String> {
    match response.get("Errors") {
        None | Some(Value::Null | Value::Bool(false)) => Vec::new(),
        Some(Value::Object(fields)) if fields.is_empty() => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(error_message).collect(),
        Some(single) => vec![error_message(single)],
    }
}

fn error_message(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(fields) => {
            let text = |key: &str| match fields.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            text("Message")
                .or_else(|| text("Code"))
                .unwrap_or_else(|| item.to_string())
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_records_without_errors() {
        let raw = br#"{"Errors":[],"SearchResults":{"NumberOfResult":2,"Parts":[
            {"MouserPartNumber":"A1","Manufacturer":"Acme"},
            {"MouserPartNumber":"C3","Availability":"In Stock"}]}}"#;
        let decoded = decode(raw).unwrap();
        assert!(decoded.errors.is_empty());
        let parts: Vec<&str> = decoded.records.iter().map(|r| r.part_number.as_str()).collect();
        assert_eq!(parts, vec!["A1", "C3"]);
        assert_eq!(decoded.records[0].manufacturer.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = br#"{"Errors":[{"Code":"E1"}],"SearchResults":{"Parts":[{"MouserPartNumber":"X"}]}}"#;
        assert_eq!(decode(raw).unwrap(), decode(raw).unwrap());
    }

    #[test]
    fn test_missing_or_null_sections_decode_to_empty() {
        let cases: [&[u8]; 4] = [
            br"{}",
            br#"{"Errors":null,"SearchResults":null}"#,
            br#"{"SearchResults":{"NumberOfResult":0}}"#,
            br#"{"SearchResults":{"Parts":null}}"#,
        ];
        for raw in cases {
            assert_eq!(decode(raw).unwrap(), DecodedResult::default());
        }
    }

    #[test]
    fn test_empty_errors_values_keep_records() {
        let cases: [&[u8]; 4] = [
            br#"{"Errors":{},"SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
            br#"{"Errors":"","SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
            br#"{"Errors":"  ","SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
            br#"{"Errors":false,"SearchResults":{"Parts":[{"MouserPartNumber":"A1"}]}}"#,
        ];
        for raw in cases {
            let decoded = decode(raw).unwrap();
            assert!(decoded.errors.is_empty(), "{}", String::from_utf8_lossy(raw));
            assert_eq!(decoded.records.len(), 1);
            assert_eq!(decoded.records[0].part_number, "A1");
        }
    }

    #[test]
    fn test_service_error_strings() {
        let decoded =
            decode(br#"{"Errors":["Invalid key"],"SearchResults":{"Parts":[]}}"#).unwrap();
        assert_eq!(decoded.errors, vec!["Invalid key".to_owned()]);
        assert!(decoded.records.is_empty());
    }

    #[test]
    fn test_error_objects_use_message_then_code_then_json() {
        let response = json!({
            "Errors": [
                {"Id": 0, "Code": "Invalid", "Message": "The API key is invalid"},
                {"Code": "TooManyRequests", "Message": ""},
                {"Id": 7},
                42
            ]
        });
        assert_eq!(
            extract_service_errors(&response),
            vec![
                "The API key is invalid".to_owned(),
                "TooManyRequests".to_owned(),
                r#"{"Id":7}"#.to_owned(),
                "42".to_owned(),
            ]
        );
    }

    #[test]
    fn test_single_error_value_is_accepted() {
        let response = json!({"Errors": "Service unavailable"});
        assert_eq!(
            extract_service_errors(&response),
            vec!["Service unavailable".to_owned()]
        );
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        assert!(matches!(decode(b"<html>"), Err(DecodeError::Json(_))));
        assert_eq!(decode(b"[1,2]"), Err(DecodeError::NotAnObject));
        assert_eq!(
            decode(br#"{"SearchResults":"none"}"#),
            Err(DecodeError::UnexpectedShape {
                field: "SearchResults"
            })
        );
        assert_eq!(
            decode(br#"{"SearchResults":{"Parts":{}}}"#),
            Err(DecodeError::UnexpectedShape {
                field: "SearchResults.Parts"
            })
        );
        assert!(matches!(
            decode(br#"{"SearchResults":{"Parts":[{"MouserPartNumber":"A"},{"Manufacturer":"B"}]}}"#),
            Err(DecodeError::InvalidPart { index: 1, .. })
        ));
        assert!(matches!(
            decode(br#"{"SearchResults":{"Parts":["A"]}}"#),
            Err(DecodeError::InvalidPart { index: 0, .. })
        ));
    }
}
