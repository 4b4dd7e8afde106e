//! Opaque entity record

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::FieldError;

/// Suffix of the annotation that carries a field's display value.
const FORMATTED_VALUE_SUFFIX: &str = "@OData.Community.Display.V1.FormattedValue";

/// One record returned by the CRM.
///
/// The schema is defined by the service; the client never interprets record
/// fields. A record is the JSON object found in a page's `value` array,
/// annotations included.
///
/// # Example
///
/// ```
/// use d365_lib::model::Record;
///
/// let record = Record::new()
///     .set("name", "Contoso")
///     .set("revenue", 1_000_000);
///
/// assert_eq!(record.get_string("name").unwrap(), Some("Contoso"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `@odata.etag` annotation, if present.
    pub fn etag(&self) -> Option<&str> {
        self.fields.get("@odata.etag").and_then(Value::as_str)
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the number of fields, annotations included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the display value the service formatted for a field, if requested.
    pub fn get_formatted(&self, field: &str) -> Option<&str> {
        self.fields
            .get(&format!("{}{}", field, FORMATTED_VALUE_SUFFIX))
            .and_then(Value::as_str)
    }

    /// Consumes the record and returns the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "string", type_name(other))),
        }
    }

    /// Gets a boolean field value.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", type_name(other))),
        }
    }

    /// Gets an integer field value.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| FieldError::type_mismatch(field, "integer", "float")),
            Some(other) => Err(FieldError::type_mismatch(field, "integer", type_name(other))),
        }
    }

    /// Gets a floating point field value. Integers are widened.
    pub fn get_f64(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(FieldError::type_mismatch(field, "number", type_name(other))),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Record {
        serde_json::from_value(json!({
            "@odata.etag": "W/\"123\"",
            "name": "Contoso",
            "revenue": 1500.5,
            "numberofemployees": 42,
            "donotemail": false,
            "parentaccountid": null,
            "statecode": 0,
            "statecode@OData.Community.Display.V1.FormattedValue": "Active"
        }))
        .unwrap()
    }

    #[test]
    fn test_deserializes_any_object() {
        let record = sample();
        assert_eq!(record.len(), 8);
        assert_eq!(record.etag(), Some("W/\"123\""));
        assert_eq!(record.get_formatted("statecode"), Some("Active"));
        assert_eq!(record.get_formatted("name"), None);
    }

    #[test]
    fn test_typed_getters() {
        let record = sample();
        assert_eq!(record.get_string("name").unwrap(), Some("Contoso"));
        assert_eq!(record.get_string("parentaccountid").unwrap(), None);
        assert_eq!(record.get_i64("numberofemployees").unwrap(), Some(42));
        assert_eq!(record.get_f64("revenue").unwrap(), Some(1500.5));
        assert_eq!(record.get_f64("numberofemployees").unwrap(), Some(42.0));
        assert_eq!(record.get_bool("donotemail").unwrap(), Some(false));
    }

    #[test]
    fn test_getter_errors() {
        let record = sample();
        assert_eq!(
            record.get_string("missing").unwrap_err(),
            FieldError::missing("missing")
        );
        assert_eq!(
            record.get_bool("name").unwrap_err(),
            FieldError::type_mismatch("name", "bool", "string")
        );
        assert_eq!(
            record.get_i64("revenue").unwrap_err(),
            FieldError::type_mismatch("revenue", "integer", "float")
        );
    }

    #[test]
    fn test_serializes_back_to_the_same_object() {
        let record = Record::new().set("id", 1);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_fields_keep_service_order() {
        let record: Record = serde_json::from_str(r#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }
}
