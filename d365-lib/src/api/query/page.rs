//! Page type for paginated query results.

use serde::Deserialize;
use serde_json::Value;

use super::QueryResult;
use crate::error::ApiError;
use crate::model::Record;
use crate::response::Payload;

pub(crate) const NEXT_LINK: &str = "@odata.nextLink";
pub(crate) const PAGING_COOKIE: &str = "@Microsoft.Dynamics.CRM.fetchxmlpagingcookie";

/// One page of a collection response, with its continuation markers.
#[derive(Debug, Clone)]
pub struct Page {
    records: Vec<Record>,
    /// OData `@odata.nextLink` for fetching the next page.
    next_link: Option<String>,
    /// FetchXML paging cookie annotation (an XML fragment).
    paging_cookie: Option<String>,
    /// Total record count (`@odata.count` or `totalrecordcount`).
    total_count: Option<usize>,
    /// FetchXML `morerecords` annotation.
    more_records: Option<bool>,
}

/// Outcome of decoding one classified response.
#[derive(Debug)]
pub(crate) enum Decoded {
    /// A body with a `value` record collection.
    Page(Page),
    /// Anything else; returned to the caller unchanged.
    Final(QueryResult),
}

impl Page {
    /// Creates a new page with records and no pagination info.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            next_link: None,
            paging_cookie: None,
            total_count: None,
            more_records: None,
        }
    }

    /// Sets the OData next link for pagination.
    pub fn with_next_link(mut self, next_link: impl Into<String>) -> Self {
        self.next_link = Some(next_link.into());
        self
    }

    /// Sets the FetchXML paging cookie annotation.
    pub fn with_paging_cookie(mut self, paging_cookie: impl Into<String>) -> Self {
        self.paging_cookie = Some(paging_cookie.into());
        self
    }

    /// Returns a reference to the records in this page.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the OData next link, if more pages are available.
    pub fn next_link(&self) -> Option<&str> {
        self.next_link.as_deref()
    }

    /// Returns the raw paging cookie annotation, if more pages are available.
    pub fn paging_cookie(&self) -> Option<&str> {
        self.paging_cookie.as_deref()
    }

    /// Returns the total record count, if the service reported one.
    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    /// Returns the FetchXML `morerecords` flag, if present.
    pub fn more_records(&self) -> Option<bool> {
        self.more_records
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decodes a classified response.
    ///
    /// A body carrying a continuation marker must also carry a `value` array
    /// of objects, otherwise the page cannot be merged and decoding fails.
    pub(crate) fn decode(payload: Payload) -> Result<Decoded, ApiError> {
        let json = match payload {
            Payload::Accepted => return Ok(Decoded::Final(QueryResult::Accepted)),
            Payload::Json(json) => json,
        };

        let has_marker = json.get(NEXT_LINK).is_some() || json.get(PAGING_COOKIE).is_some();
        let is_record_list = json
            .get("value")
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().all(Value::is_object));

        if !is_record_list {
            if has_marker {
                return Err(ApiError::decode(
                    "paged response has no `value` record collection",
                ));
            }
            return Ok(Decoded::Final(passthrough(json)));
        }

        let body: CollectionBody = serde_json::from_value(json)
            .map_err(|e| ApiError::decode(format!("invalid collection page: {}", e)))?;

        Ok(Decoded::Page(body.into_page()))
    }

    /// Decodes a continuation page, which must be a record collection.
    pub(crate) fn decode_continuation(payload: Payload) -> Result<Page, ApiError> {
        match Self::decode(payload)? {
            Decoded::Page(page) => Ok(page),
            Decoded::Final(_) => Err(ApiError::decode(
                "continuation response has no `value` record collection",
            )),
        }
    }
}

/// The `value` field if present, otherwise the whole body.
fn passthrough(json: Value) -> QueryResult {
    match json {
        Value::Object(mut map) => match map.remove("value") {
            Some(value) => QueryResult::Document(value),
            None => QueryResult::Document(Value::Object(map)),
        },
        other => QueryResult::Document(other),
    }
}

/// Collection response shared by OData and FetchXML queries.
#[derive(Debug, Deserialize)]
struct CollectionBody {
    value: Vec<Record>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
    #[serde(rename = "@odata.count")]
    count: Option<usize>,
    #[serde(rename = "@Microsoft.Dynamics.CRM.fetchxmlpagingcookie")]
    paging_cookie: Option<String>,
    /// -1 unless `returntotalrecordcount="true"` was requested.
    #[serde(rename = "@Microsoft.Dynamics.CRM.totalrecordcount")]
    total_record_count: Option<i64>,
    #[serde(rename = "@Microsoft.Dynamics.CRM.morerecords")]
    more_records: Option<bool>,
}

impl CollectionBody {
    fn into_page(self) -> Page {
        let total_count = self.count.or_else(|| {
            self.total_record_count
                .and_then(|n| usize::try_from(n).ok())
        });

        Page {
            records: self.value,
            next_link: self.next_link,
            paging_cookie: self.paging_cookie,
            total_count,
            more_records: self.more_records,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: Value) -> Decoded {
        Page::decode(Payload::Json(value)).unwrap()
    }

    #[test]
    fn test_accepted_passes_through() {
        assert!(matches!(
            Page::decode(Payload::Accepted).unwrap(),
            Decoded::Final(QueryResult::Accepted)
        ));
    }

    #[test]
    fn test_collection_with_next_link() {
        let decoded = decode(json!({
            "@odata.context": "ctx",
            "@odata.count": 3,
            "value": [{"id": 1}, {"id": 2}],
            "@odata.nextLink": "https://org/api/data/v9.1/accounts?$skiptoken=x"
        }));

        let Decoded::Page(page) = decoded else {
            panic!("expected a page");
        };
        assert_eq!(page.len(), 2);
        assert_eq!(
            page.next_link(),
            Some("https://org/api/data/v9.1/accounts?$skiptoken=x")
        );
        assert_eq!(page.paging_cookie(), None);
        assert_eq!(page.total_count(), Some(3));
    }

    #[test]
    fn test_collection_with_paging_cookie() {
        let Decoded::Page(page) = decode(json!({
            "value": [{"id": 1}],
            "@Microsoft.Dynamics.CRM.fetchxmlpagingcookie": "<cookie pagingcookie=\"x\" />",
            "@Microsoft.Dynamics.CRM.morerecords": true,
            "@Microsoft.Dynamics.CRM.totalrecordcount": -1
        })) else {
            panic!("expected a page");
        };
        assert_eq!(page.paging_cookie(), Some("<cookie pagingcookie=\"x\" />"));
        assert_eq!(page.more_records(), Some(true));
        assert_eq!(page.total_count(), None);
    }

    #[test]
    fn test_body_without_value_is_returned_whole() {
        let body = json!({"accountid": "abc", "name": "Contoso"});
        match decode(body.clone()) {
            Decoded::Final(QueryResult::Document(doc)) => assert_eq!(doc, body),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scalar_value_is_returned_alone() {
        match decode(json!({"@odata.context": "ctx", "value": 42})) {
            Decoded::Final(QueryResult::Document(doc)) => assert_eq!(doc, json!(42)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_marker_without_collection_is_a_decode_error() {
        let result = Page::decode(Payload::Json(json!({"@odata.nextLink": "u"})));
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_continuation_must_be_a_collection() {
        let result = Page::decode_continuation(Payload::Accepted);
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }
}
