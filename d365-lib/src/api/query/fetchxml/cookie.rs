//! FetchXML paging cookie.

use xmltree::Element;

use crate::error::ApiError;

/// The decoded paging cookie of a FetchXML page.
///
/// The service returns it inside the
/// `@Microsoft.Dynamics.CRM.fetchxmlpagingcookie` annotation, an XML fragment
/// such as `<cookie pagenumber="2" pagingcookie="%253ccookie..." />` whose
/// `pagingcookie` attribute is URL-encoded twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingCookie(String);

impl PagingCookie {
    /// Extracts and decodes the cookie from the annotation value.
    pub fn from_annotation(annotation: &str) -> Result<Self, ApiError> {
        let element = Element::parse(annotation.as_bytes())
            .map_err(|e| ApiError::decode(format!("paging cookie annotation is not XML: {}", e)))?;

        let encoded = element
            .attributes
            .get("pagingcookie")
            .ok_or_else(|| ApiError::decode("paging cookie annotation has no pagingcookie attribute"))?;

        let once = urlencoding::decode(encoded)
            .map_err(|e| ApiError::decode(format!("paging cookie is not valid UTF-8: {}", e)))?;
        let twice = urlencoding::decode(&once)
            .map_err(|e| ApiError::decode(format!("paging cookie is not valid UTF-8: {}", e)))?;

        Ok(Self(twice.into_owned()))
    }

    /// Returns the decoded cookie.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
