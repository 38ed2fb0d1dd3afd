//! Field normalization for exported documents
//!
//! Documents come out of the driver as BSON, which carries types that have
//! no JSON-native form (ObjectId, DateTime, Decimal128, ...). This module
//! converts a document into a JSON value ready for serialization:
//!
//! - Designated fields are normalized by rule: identifiers to their hex
//!   string form, identifier lists element-wise, timestamps to RFC 3339.
//! - All other fields pass through a generic conversion that keeps native
//!   scalars as-is and renders the remaining BSON types as text.
//!
//! Rules apply only to fields actually present in a document; absent
//! optional fields stay absent. Values with no faithful JSON form (NaN,
//! MinKey, code, ...) fail normalization rather than being silently
//! mangled.

use bson::{Bson, Document};
use chrono::SecondsFormat;
use serde_json::{Map, Value as JsonValue};

use crate::error::NormalizeError;

/// Normalization rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Opaque document identifier, exported as its textual (hex) form.
    Id,

    /// List of identifiers, converted element-wise; order and length are
    /// preserved.
    IdList,

    /// Creation timestamp, exported as an RFC 3339 string.
    Timestamp,
}

/// Per-collection set of field normalization rules.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: Vec<(String, FieldRule)>,
}

impl FieldRules {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for a field (builder style).
    pub fn rule(mut self, field: &str, rule: FieldRule) -> Self {
        self.rules.push((field.to_string(), rule));
        self
    }

    /// Look up the rule for a field, if any.
    fn get(&self, field: &str) -> Option<FieldRule> {
        self.rules
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rule)| *rule)
    }
}

/// Normalize a full document into a JSON object.
///
/// Field order of the source document is preserved.
///
/// # Arguments
/// * `doc` - Source BSON document
/// * `rules` - Field rules for this collection
///
/// # Returns
/// * JSON object value, or the first normalization failure
pub fn normalize_document(
    doc: &Document,
    rules: &FieldRules,
) -> Result<JsonValue, NormalizeError> {
    let mut out = Map::with_capacity(doc.len());

    for (key, value) in doc {
        let converted = match rules.get(key) {
            Some(FieldRule::Id) => JsonValue::String(id_to_string(key, value)?),
            Some(FieldRule::IdList) => id_list_to_strings(key, value)?,
            Some(FieldRule::Timestamp) => JsonValue::String(timestamp_to_string(key, value)?),
            None => bson_to_json(key, value)?,
        };
        out.insert(key.clone(), converted);
    }

    Ok(JsonValue::Object(out))
}

/// Convert an identifier value to its textual form.
fn id_to_string(field: &str, value: &Bson) -> Result<String, NormalizeError> {
    match value {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        Bson::String(s) => Ok(s.clone()),
        Bson::Int32(n) => Ok(n.to_string()),
        Bson::Int64(n) => Ok(n.to_string()),
        other => Err(NormalizeError::Unrepresentable {
            field: field.to_string(),
            kind: bson_kind(other),
        }),
    }
}

/// Convert an identifier list element-wise, preserving order and length.
fn id_list_to_strings(field: &str, value: &Bson) -> Result<JsonValue, NormalizeError> {
    let Bson::Array(items) = value else {
        return Err(NormalizeError::NotAList {
            field: field.to_string(),
        });
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let label = format!("{field}[{i}]");
        out.push(JsonValue::String(id_to_string(&label, item)?));
    }
    Ok(JsonValue::Array(out))
}

/// Convert a timestamp value to a canonical RFC 3339 string.
///
/// Millisecond precision with a `Z` suffix, matching BSON datetime
/// resolution, so the string re-parses to the original instant.
fn timestamp_to_string(field: &str, value: &Bson) -> Result<String, NormalizeError> {
    match value {
        Bson::DateTime(dt) => Ok(dt
            .to_chrono()
            .to_rfc3339_opts(SecondsFormat::Millis, true)),
        Bson::String(s) => Ok(s.clone()),
        other => Err(NormalizeError::Unrepresentable {
            field: field.to_string(),
            kind: bson_kind(other),
        }),
    }
}

/// Generic BSON to JSON conversion for non-designated fields.
///
/// Native scalars map directly; BSON-only types with a faithful textual
/// form become strings; everything else is an error.
fn bson_to_json(field: &str, value: &Bson) -> Result<JsonValue, NormalizeError> {
    let json = match value {
        Bson::String(s) => JsonValue::String(s.clone()),
        Bson::Int32(n) => JsonValue::Number((*n).into()),
        Bson::Int64(n) => JsonValue::Number((*n).into()),
        Bson::Double(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or(NormalizeError::Unrepresentable {
                field: field.to_string(),
                kind: "non-finite double",
            })?,
        Bson::Boolean(b) => JsonValue::Bool(*b),
        Bson::Null => JsonValue::Null,
        Bson::ObjectId(oid) => JsonValue::String(oid.to_hex()),
        Bson::DateTime(dt) => JsonValue::String(
            dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        Bson::Decimal128(d) => JsonValue::String(d.to_string()),
        Bson::Binary(bin) => JsonValue::String(hex::encode(&bin.bytes)),
        Bson::RegularExpression(regex) => {
            JsonValue::String(format!("/{}/{}", regex.pattern, regex.options))
        }
        Bson::Timestamp(ts) => {
            JsonValue::String(format!("Timestamp({}, {})", ts.time, ts.increment))
        }
        Bson::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(bson_to_json(&format!("{field}[{i}]"), item)?);
            }
            JsonValue::Array(out)
        }
        Bson::Document(doc) => {
            let mut out = Map::with_capacity(doc.len());
            for (key, nested) in doc {
                out.insert(
                    key.clone(),
                    bson_to_json(&format!("{field}.{key}"), nested)?,
                );
            }
            JsonValue::Object(out)
        }
        other => {
            return Err(NormalizeError::Unrepresentable {
                field: field.to_string(),
                kind: bson_kind(other),
            });
        }
    };

    Ok(json)
}

/// Human-readable BSON type name for error messages.
fn bson_kind(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "boolean",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript code",
        Bson::JavaScriptCodeWithScope(_) => "javascript code with scope",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binary",
        Bson::ObjectId(_) => "objectid",
        Bson::DateTime(_) => "datetime",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal128",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxkey",
        Bson::MinKey => "minkey",
        Bson::DbPointer(_) => "dbpointer",
    }
}
