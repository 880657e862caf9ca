use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============ CRM Lead ============

/// A lead record as returned by the CRM `Leads` module.
///
/// Only the fields the job reads or writes are typed; everything else the CRM
/// sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// CRM record identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Full_Name", default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(rename = "Priority_level", default, deserialize_with = "lenient_picklist")]
    pub priority_level: Option<PriorityLevel>,
    #[serde(rename = "Industry", default, deserialize_with = "lenient_picklist")]
    pub industry: Option<Industry>,
    /// Recomputed on every run, so a value of the wrong shape is dropped.
    #[serde(rename = "User_score", default, deserialize_with = "lenient_score")]
    pub user_score: Option<i64>,
    /// Remaining CRM fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Lead {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            email: None,
            priority_level: None,
            industry: None,
            user_score: None,
            extra: Map::new(),
        }
    }
}

/// Value of the `Priority_level` picklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
    /// Any other picklist value, kept verbatim.
    Other(String),
}

impl From<String> for PriorityLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "High" => PriorityLevel::High,
            "Medium" => PriorityLevel::Medium,
            "Low" => PriorityLevel::Low,
            _ => PriorityLevel::Other(value),
        }
    }
}

impl From<PriorityLevel> for String {
    fn from(value: PriorityLevel) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityLevel::High => f.write_str("High"),
            PriorityLevel::Medium => f.write_str("Medium"),
            PriorityLevel::Low => f.write_str("Low"),
            PriorityLevel::Other(s) => f.write_str(s),
        }
    }
}

/// Value of the `Industry` picklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Industry {
    LargeEnterprise,
    SmallMediumEnterprise,
    Other(String),
}

impl From<String> for Industry {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Large Enterprise" => Industry::LargeEnterprise,
            "Small/Medium Enterprise" => Industry::SmallMediumEnterprise,
            _ => Industry::Other(value),
        }
    }
}

impl From<Industry> for String {
    fn from(value: Industry) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Industry::LargeEnterprise => f.write_str("Large Enterprise"),
            Industry::SmallMediumEnterprise => f.write_str("Small/Medium Enterprise"),
            Industry::Other(s) => f.write_str(s),
        }
    }
}

/// CRM ids are strings, but some payloads carry them as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Str(String),
        Int(i64),
    }

    Ok(match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Str(s) => s,
        StringOrInt::Int(n) => n.to_string(),
    })
}

/// Strings pass through, numbers and booleans are stringified, anything else is unset.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_picklist<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(lenient_text(deserializer)?.map(T::from))
}

/// Accepts integers, decimals (rounded) and numeric strings.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

// ============ CRM Wire Types ============

/// One page of `GET /Leads`.
///
/// Records stay raw so each lead can be decoded on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadPage {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub info: PageInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub more_records: bool,
}

/// Body of `PUT /Leads/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdate {
    pub data: Vec<ScoreUpdateRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdateRecord {
    #[serde(rename = "User_score")]
    pub user_score: i64,
}

impl ScoreUpdate {
    pub fn new(score: i64) -> Self {
        Self {
            data: vec![ScoreUpdateRecord { user_score: score }],
        }
    }
}

/// Per-record result in a CRM write response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResult {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub data: Vec<RecordResult>,
}

// ============ Identity / Chat Wire Types ============

/// Response of the OAuth token endpoint.
///
/// The provider answers some failures with a 200 and an `error` field.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body posted to the chat webhook.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub text: String,
}
