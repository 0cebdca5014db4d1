//! Inbound frame decoding.
//!
//! A frame is one message body received over the broker subscription:
//! a JSON object with a `transactions` array. Elements are decoded
//! independently — an invalid element is dropped without affecting its
//! siblings. A body with no parseable `transactions` array fails as a
//! whole, and the connector drops the frame (lossy-decoding policy).

use crate::error::DecodeError;
use crate::event::TransactionScoreEvent;
use serde_json::Value;

/// Decode a raw frame body into the valid events it carries.
///
/// Returns `Err` only when the body itself is unusable; per-record
/// failures are silent drops by contract.
pub fn decode_frame(body: &str) -> Result<Vec<TransactionScoreEvent>, DecodeError> {
    let v: Value = serde_json::from_str(body)?;
    if !v.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let records = v
        .get("transactions")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingTransactions)?;

    Ok(records
        .iter()
        .filter_map(|r| TransactionScoreEvent::from_value(r).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_frame_with_two_records() {
        let body = r#"{
            "transactions": [
                {"id": 1, "time": "2024-05-01T12:00:00Z", "amount": 10.0,
                 "merchant": "A", "isFraud": false},
                {"id": 2, "time": "2024-05-01T12:00:01Z", "amount": 20.0,
                 "merchant": "B", "isFraud": true}
            ]
        }"#;
        let events = decode_frame(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id, "2");
    }

    #[test]
    fn invalid_record_dropped_valid_kept() {
        // Second record has no id — exactly one event survives.
        let body = r#"{
            "transactions": [
                {"id": 1, "time": "2024-05-01T12:00:00Z", "amount": 10.0,
                 "merchant": "A", "isFraud": false},
                {"time": "2024-05-01T12:00:01Z", "amount": 20.0,
                 "merchant": "B", "isFraud": true}
            ]
        }"#;
        let events = decode_frame(body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "1");
    }

    #[test]
    fn unknown_top_level_fields_ignored() {
        let body = r#"{"transactions": [], "cursor": "abc", "serverTime": 123}"#;
        assert!(decode_frame(body).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame("[1,2,3]").is_err());
        assert!(decode_frame(r#"{"items": []}"#).is_err());
    }
}
