//! Result of a full retrieval.

use serde_json::Value;

use crate::model::Record;

/// What a retrieval returns once every page has been fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Records from every page, concatenated in fetch order.
    Records(Vec<Record>),
    /// A response that was not a record collection: the non-list `value`
    /// field if there was one, otherwise the whole decoded body (for example
    /// a single-entity retrieve).
    Document(Value),
    /// The service answered 201 or 204 without a body.
    Accepted,
}

impl QueryResult {
    /// Returns the records, if this result is a record collection.
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Consumes the result and returns the records, if any.
    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Returns the document, if this result is not a record collection.
    pub fn as_document(&self) -> Option<&Value> {
        match self {
            Self::Document(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for a bodiless success.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Converts the result back into JSON: an array for records, the
    /// document itself, or `true` for a bodiless success.
    pub fn into_json(self) -> Value {
        match self {
            Self::Records(records) => {
                Value::Array(records.into_iter().map(|r| Value::Object(r.into_map())).collect())
            }
            Self::Document(value) => value,
            Self::Accepted => Value::Bool(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_into_json() {
        let records = QueryResult::Records(vec![Record::new().set("id", 1), Record::new().set("id", 2)]);
        assert_eq!(records.into_json(), json!([{"id": 1}, {"id": 2}]));
        assert_eq!(QueryResult::Accepted.into_json(), json!(true));
        assert_eq!(QueryResult::Document(json!({"a": 1})).into_json(), json!({"a": 1}));
    }

    #[test]
    fn test_accessors() {
        let result = QueryResult::Records(vec![Record::new()]);
        assert_eq!(result.records().map(<[Record]>::len), Some(1));
        assert!(result.as_document().is_none());
        assert!(!result.is_accepted());
        assert_eq!(QueryResult::Accepted.into_records(), None);
    }
}
