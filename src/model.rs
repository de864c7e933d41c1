use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

pub const RAINFALL_DEVIATION: &str = "Rainfall_Deviation";
pub const MARKET_VOLATILITY: &str = "Market_Volatility";
pub const INPUT_COST: &str = "Input_Cost";

// =============================================================================
// Request side
// =============================================================================

/// A single serialized form field. Form fields travel as text; simulation
/// overrides are coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Flat field name -> value mapping sent as the `/predict` body.
/// Keeps insertion order so the wire body mirrors the form layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskInput {
    fields: Vec<(String, FieldValue)>,
}

impl RiskInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field, keeping its original position on overwrite.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn set_text(&mut self, name: &str, value: &str) {
        self.set(name, FieldValue::Text(value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Short content hash of the wire body, used to correlate log records.
    pub fn fingerprint(&self) -> String {
        let body = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&body);
        hex::encode(&digest[..8])
    }
}

impl Serialize for RiskInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// =============================================================================
// Response side
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Other(String),
}

impl From<String> for RiskLevel {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "LOW" => RiskLevel::Low,
            "MODERATE" => RiskLevel::Moderate,
            "HIGH" => RiskLevel::High,
            _ => RiskLevel::Other(raw),
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Other(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RiskLevel::from(String::deserialize(deserializer)?))
    }
}

/// Named contributing factors in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakdown(pub Vec<(String, f64)>);

impl Breakdown {
    pub fn entries(&self) -> &[(String, f64)] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Breakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Breakdown;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of factor name to numeric weight")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Breakdown, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, weight)) = access.next_entry::<String, f64>()? {
                    entries.push((name, weight));
                }
                Ok(Breakdown(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    #[serde(other)]
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alert {
    #[serde(rename = "type", default)]
    pub severity: Severity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskResult {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub breakdown: Option<Breakdown>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub adjustments: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<Value>,
}

/// Outcome of one `/predict` round trip that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Scored(RiskResult),
    Rejected(String),
}

impl Prediction {
    /// Classify a raw response body. A non-null `error` wins over every
    /// other field. Decoding goes straight from bytes so object key order
    /// (and with it the breakdown order) survives.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let envelope: ErrorEnvelope =
            serde_json::from_slice(body).context("response is not a JSON object")?;
        match envelope.error {
            None | Some(Value::Null) => {}
            Some(Value::String(msg)) => return Ok(Prediction::Rejected(msg)),
            Some(other) => return Ok(Prediction::Rejected(other.to_string())),
        }
        let result: RiskResult =
            serde_json::from_slice(body).context("response is not a risk result")?;
        Ok(Prediction::Scored(result))
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Prediction::Scored(r) => Some(r.risk_score),
            Prediction::Rejected(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::top_drivers;

    #[test]
    fn input_overwrite_keeps_position() {
        let mut input = RiskInput::new();
        input.set_text("Season", "MONSOON");
        input.set_text(INPUT_COST, "100");
        input.set(INPUT_COST, FieldValue::Number(120.0));
        let body = serde_json::to_string(&input).unwrap();
        assert_eq!(body, r#"{"Season":"MONSOON","Input_Cost":120.0}"#);
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut a = RiskInput::new();
        a.set_text(RAINFALL_DEVIATION, "10");
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.set_text(RAINFALL_DEVIATION, "11");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn error_body_is_rejected() {
        let p = Prediction::from_slice(br#"{"error": "could not convert string to float"}"#).unwrap();
        assert_eq!(p, Prediction::Rejected("could not convert string to float".into()));
        assert_eq!(p.score(), None);
    }

    #[test]
    fn scored_body_keeps_breakdown_order_and_defaults() {
        let body = br#"{
            "risk_score": 62.4,
            "risk_level": "MODERATE",
            "breakdown": {"weather": 40.0, "market": 90.0, "financial": 40.0},
            "summary": "Market price volatility is heavily impacting stability.",
            "alerts": [
                {"type": "warning", "title": "Moderate Risk Detected", "message": "m"},
                {"type": "notice", "title": "t", "message": "m"}
            ],
            "error": null
        }"#;
        let Prediction::Scored(r) = Prediction::from_slice(body).unwrap() else {
            panic!("expected scored");
        };
        assert_eq!(r.risk_level, RiskLevel::Moderate);
        let names: Vec<&str> = r.breakdown.as_ref().unwrap().entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["weather", "market", "financial"]);
        assert_eq!(r.alerts[0].severity, Severity::Warning);
        assert_eq!(r.alerts[1].severity, Severity::Info);
        assert!(r.recommendations.is_empty());
        assert!(r.adjustments.is_empty());
    }

    #[test]
    fn tied_weights_keep_wire_order_through_decoding() {
        let body = br#"{
            "risk_score": 40.0,
            "risk_level": "MODERATE",
            "breakdown": {"weather": 40, "soil": 40, "market": 40, "financial": 40}
        }"#;
        let Prediction::Scored(r) = Prediction::from_slice(body).unwrap() else {
            panic!("expected scored");
        };
        let top: Vec<String> = top_drivers(r.breakdown.as_ref().unwrap())
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(top, vec!["weather", "soil", "market"]);
    }

    #[test]
    fn unknown_level_is_preserved() {
        assert_eq!(RiskLevel::from("EXTREME".to_string()), RiskLevel::Other("EXTREME".into()));
        assert_eq!(RiskLevel::from("low".to_string()).as_str(), "low");
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(Prediction::from_slice(br#"{"risk_level": "LOW"}"#).is_err());
        assert!(Prediction::from_slice(b"<html>oops</html>").is_err());
    }

    #[test]
    fn non_string_error_is_still_rejected() {
        let p = Prediction::from_slice(br#"{"error": {"code": 7}, "risk_score": 10}"#).unwrap();
        assert_eq!(p, Prediction::Rejected(r#"{"code":7}"#.into()));
    }

    #[test]
    fn text_fields_parse_as_numbers() {
        assert_eq!(FieldValue::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(FieldValue::Text("abc".into()).as_f64(), None);
    }
}
