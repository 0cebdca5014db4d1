//! Canonical transaction-score event and its wire decoding.
//!
//! Wire payloads vary: score-rich frames carry `score`, per-model scores and
//! a `prediction` verdict; score-poor frames carry only the transaction
//! fields plus `isFraud`. Decoding normalizes both shapes into
//! [`TransactionScoreEvent`]. Records missing a required field are rejected
//! individually; the surrounding frame is unaffected.

use crate::error::DecodeError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Categorical fraud verdict attached to a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    Fraud,
    Normal,
}

impl Prediction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prediction::Fraud => "fraud",
            Prediction::Normal => "normal",
        }
    }
}

/// Display severity bucket derived from the clamped score.
///
/// Only used for labeling/coloring; storage always keeps the raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Elevated,
    High,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        let s = score.clamp(0.0, 1.0);
        if s >= 0.8 {
            Severity::High
        } else if s >= 0.5 {
            Severity::Elevated
        } else {
            Severity::Low
        }
    }
}

/// One scored transaction as observed from the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionScoreEvent {
    /// Source transaction identifier. The wire carries a JSON number or
    /// string; both are normalized to a string.
    pub id: String,
    /// Point in time the event pertains to (wire field `time`, ISO-8601).
    pub timestamp: DateTime<Utc>,
    /// Transaction amount; finite and non-negative.
    pub amount: f64,
    /// Counterparty display string; may be empty.
    pub merchant: String,
    /// Aggregate fraud probability. Expected in [0,1] but stored as-is —
    /// clamping happens only in `clamped_score()` / `severity()`.
    pub score: f64,
    /// Per-model scores keyed by model name ("lgbm", "xgb", "cat" are the
    /// known set; missing and extra keys are both tolerated).
    pub model_scores: BTreeMap<String, f64>,
    /// Verdict; authoritative over `is_fraud` when both are on the wire.
    pub prediction: Prediction,
    /// Boolean-coercible wire flag, retained for payload fidelity.
    pub is_fraud: bool,
}

impl TransactionScoreEvent {
    /// Decode one `transactions[]` element.
    ///
    /// Required: `id`, `time`, `amount`, `merchant`, and at least one of
    /// `isFraud` / `prediction`. Unknown fields are ignored.
    pub fn from_value(v: &Value) -> Result<Self, DecodeError> {
        let obj = v.as_object().ok_or(DecodeError::NotAnObject)?;

        let id = obj
            .get("id")
            .and_then(coerce_id)
            .ok_or_else(|| DecodeError::missing("id"))?;

        let timestamp = obj
            .get("time")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::missing("time"))
            .and_then(parse_timestamp)?;

        let amount = obj
            .get("amount")
            .and_then(Value::as_f64)
            .ok_or_else(|| DecodeError::missing("amount"))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(DecodeError::invalid("amount", format!("{amount} is not a non-negative number")));
        }

        let merchant = obj
            .get("merchant")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::missing("merchant"))?
            .to_string();

        let prediction = match obj.get("prediction").and_then(Value::as_str) {
            Some("fraud") => Some(Prediction::Fraud),
            Some("normal") => Some(Prediction::Normal),
            Some(other) => {
                return Err(DecodeError::invalid("prediction", format!("unknown verdict '{other}'")))
            }
            None => None,
        };
        let is_fraud = obj.get("isFraud").and_then(coerce_bool);

        // `prediction` wins when both are present; either alone suffices.
        let prediction = match (prediction, is_fraud) {
            (Some(p), _) => p,
            (None, Some(true)) => Prediction::Fraud,
            (None, Some(false)) => Prediction::Normal,
            (None, None) => return Err(DecodeError::missing("isFraud")),
        };
        let is_fraud = is_fraud.unwrap_or(prediction == Prediction::Fraud);

        // Stored raw even when outside [0,1].
        let score = obj.get("score").and_then(Value::as_f64).unwrap_or(0.0);

        let model_scores = obj
            .get("models")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id,
            timestamp,
            amount,
            merchant,
            score,
            model_scores,
            prediction,
            is_fraud,
        })
    }

    /// Score clamped to [0,1] for coloring/labeling.
    pub fn clamped_score(&self) -> f64 {
        self.score.clamp(0.0, 1.0)
    }

    /// Display severity bucket for the clamped score.
    pub fn severity(&self) -> Severity {
        Severity::from_score(self.score)
    }

    /// Whether this event belongs in the fraud-only overlay series.
    /// `prediction` is authoritative, not `is_fraud`.
    pub fn is_flagged(&self) -> bool {
        self.prediction == Prediction::Fraud
    }
}

/// Accept a JSON number or string as an identifier.
fn coerce_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Boolean-coercible: bool, number (non-zero = true), or "true"/"false"/"1"/"0".
fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp, with or without a zone suffix.
/// Zoneless timestamps are taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DecodeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|n| n.and_utc())
        .map_err(|e| DecodeError::invalid("time", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rich_record() -> Value {
        json!({
            "id": 4711,
            "time": "2024-05-01T12:00:00Z",
            "amount": 129.95,
            "merchant": "ACME Store",
            "score": 0.91,
            "models": { "lgbm": 0.93, "xgb": 0.88, "cat": 0.92 },
            "prediction": "fraud",
            "isFraud": true
        })
    }

    #[test]
    fn decode_rich_record() {
        let e = TransactionScoreEvent::from_value(&rich_record()).unwrap();
        assert_eq!(e.id, "4711");
        assert_eq!(e.amount, 129.95);
        assert_eq!(e.merchant, "ACME Store");
        assert_eq!(e.prediction, Prediction::Fraud);
        assert!(e.is_fraud);
        assert_eq!(e.model_scores.len(), 3);
        assert_eq!(e.model_scores["lgbm"], 0.93);
    }

    #[test]
    fn missing_id_is_rejected() {
        let mut v = rich_record();
        v.as_object_mut().unwrap().remove("id");
        let err = TransactionScoreEvent::from_value(&v).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { ref field } if field == "id"));
    }

    #[test]
    fn string_id_accepted() {
        let mut v = rich_record();
        v["id"] = json!("tx-99");
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert_eq!(e.id, "tx-99");
    }

    #[test]
    fn is_fraud_coercions() {
        for (raw, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!(0), false),
            (json!("true"), true),
            (json!("0"), false),
        ] {
            let mut v = rich_record();
            let obj = v.as_object_mut().unwrap();
            obj.remove("prediction");
            obj.insert("isFraud".into(), raw);
            let e = TransactionScoreEvent::from_value(&v).unwrap();
            assert_eq!(e.is_fraud, expected);
            assert_eq!(e.is_flagged(), expected);
        }
    }

    #[test]
    fn prediction_wins_over_is_fraud() {
        let mut v = rich_record();
        v["prediction"] = json!("normal");
        v["isFraud"] = json!(true);
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert!(!e.is_flagged());
        // The wire flag is kept as delivered.
        assert!(e.is_fraud);
    }

    #[test]
    fn missing_both_verdict_fields_rejected() {
        let mut v = rich_record();
        let obj = v.as_object_mut().unwrap();
        obj.remove("prediction");
        obj.remove("isFraud");
        assert!(TransactionScoreEvent::from_value(&v).is_err());
    }

    #[test]
    fn score_poor_record_defaults() {
        let v = json!({
            "id": 1,
            "time": "2024-05-01T12:00:00",
            "amount": 10.0,
            "merchant": "",
            "isFraud": false
        });
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert_eq!(e.score, 0.0);
        assert!(e.model_scores.is_empty());
        assert_eq!(e.prediction, Prediction::Normal);
        assert_eq!(e.merchant, "");
    }

    #[test]
    fn out_of_range_score_stored_raw() {
        let mut v = rich_record();
        v["score"] = json!(1.7);
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert_eq!(e.score, 1.7);
        assert_eq!(e.clamped_score(), 1.0);
        assert_eq!(e.severity(), Severity::High);
    }

    #[test]
    fn extra_model_keys_preserved() {
        let mut v = rich_record();
        v["models"]["mystery"] = json!(0.5);
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert_eq!(e.model_scores.len(), 4);
        assert_eq!(e.model_scores["mystery"], 0.5);
    }

    #[test]
    fn negative_amount_rejected() {
        let mut v = rich_record();
        v["amount"] = json!(-5.0);
        assert!(TransactionScoreEvent::from_value(&v).is_err());
    }

    #[test]
    fn zoneless_timestamp_taken_as_utc() {
        let mut v = rich_record();
        v["time"] = json!("2024-05-01T12:00:00.250");
        let e = TransactionScoreEvent::from_value(&v).unwrap();
        assert_eq!(e.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn severity_buckets() {
        assert_eq!(Severity::from_score(0.1), Severity::Low);
        assert_eq!(Severity::from_score(0.6), Severity::Elevated);
        assert_eq!(Severity::from_score(0.95), Severity::High);
        assert_eq!(Severity::from_score(-3.0), Severity::Low);
    }
}
