use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// Source column names as they appear in the upstream table. The wire keys on
// our own endpoint are fixed by the existing API shape and must not change.
pub const COL_PSEUDO: &str = "Pseudo ZAP";
pub const COL_PRESENTATION: &str = "Présentation";
pub const COL_STYLES: &str = "Styles de musique";
pub const COL_INSTRUMENTS: &str = "Instruments";
pub const COL_ROLES: &str = "Role(s) Communauté(s)";

pub fn source_columns() -> Vec<&'static str> {
    vec![
        COL_PSEUDO,
        COL_PRESENTATION,
        COL_STYLES,
        COL_INSTRUMENTS,
        COL_ROLES,
    ]
}

/// One normalized community member profile. Every field is always present
/// and well-typed no matter what shape the source row had.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZapRecord {
    #[serde(rename = "PseudoZAP")]
    pub pseudo: String,

    #[serde(rename = "Presentation")]
    pub presentation: String,

    #[serde(rename = "Styles")]
    pub styles: Vec<String>,

    #[serde(rename = "Instruments")]
    pub instruments: Vec<String>,

    #[serde(rename = "RoleCommunaute")]
    pub roles: Vec<String>,
}

fn text_field(fields: &Map<String, Value>, column: &str) -> String {
    match fields.get(column) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn tag_field(fields: &Map<String, Value>, column: &str) -> Vec<String> {
    match fields.get(column) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

// The role cell is a single whitespace-separated string upstream. Runs of
// spaces and leading/trailing whitespace never produce empty tokens.
fn role_field(fields: &Map<String, Value>, column: &str) -> Vec<String> {
    match fields.get(column) {
        Some(Value::String(s)) => s
            .split_whitespace()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Maps one raw field bag to a [`ZapRecord`], substituting the documented
/// default for every absent or wrong-typed field. Pure: no I/O, no state.
pub fn normalize_fields(fields: &Map<String, Value>) -> ZapRecord {
    ZapRecord {
        pseudo: text_field(fields, COL_PSEUDO),
        presentation: text_field(fields, COL_PRESENTATION),
        styles: tag_field(fields, COL_STYLES),
        instruments: tag_field(fields, COL_INSTRUMENTS),
        roles: role_field(fields, COL_ROLES),
    }
}
