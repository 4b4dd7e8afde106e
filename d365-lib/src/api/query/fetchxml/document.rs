//! FetchXML query document.

use std::str::FromStr;

use xmltree::Element;
use xmltree::EmitterConfig;
use xmltree::XMLNode;

use crate::error::QueryError;

/// A parsed FetchXML query.
///
/// Paging never mutates the parsed document: [`FetchXml::with_paging`]
/// returns a copy carrying the paging attributes for one page.
///
/// # Example
///
/// ```
/// use d365_lib::api::query::FetchXml;
///
/// let query = FetchXml::parse(
///     r#"<fetch mapping="logical"><entity name="account"><attribute name="name"/></entity></fetch>"#,
/// )?;
/// assert_eq!(query.entity_name()?, "account");
/// assert_eq!(query.entity_set_name()?, "accounts");
/// # Ok::<(), d365_lib::error::QueryError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FetchXml {
    root: Element,
}

impl FetchXml {
    /// Parses a FetchXML document.
    pub fn parse(xml: &str) -> Result<Self, QueryError> {
        let root = Element::parse(xml.as_bytes())
            .map_err(|e| QueryError::MalformedQuery(e.to_string()))?;
        Ok(Self { root })
    }

    /// Returns the `name` attribute of the root's first child element.
    pub fn entity_name(&self) -> Result<&str, QueryError> {
        self.root
            .children
            .iter()
            .find_map(XMLNode::as_element)
            .and_then(|entity| entity.attributes.get("name"))
            .map(String::as_str)
            .ok_or(QueryError::MissingEntityName)
    }

    /// Returns the entity set the query is sent to.
    ///
    /// The set name is the entity name with an `s` appended; irregular
    /// plurals (`opportunity` → `opportunities`) are not handled.
    pub fn entity_set_name(&self) -> Result<String, QueryError> {
        Ok(format!("{}s", self.entity_name()?))
    }

    /// Returns an attribute of the root element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.root.attributes.get(name).map(String::as_str)
    }

    /// Returns a copy of the query set up to fetch page `page`.
    ///
    /// Sets `paging-cookie`, `count` and `page` on the root element. The
    /// cookie is given decoded; it is escaped when serialised.
    pub fn with_paging(&self, paging_cookie: &str, count: u32, page: u32) -> Self {
        let mut root = self.root.clone();
        root.attributes
            .insert("paging-cookie".to_string(), paging_cookie.to_string());
        root.attributes.insert("count".to_string(), count.to_string());
        root.attributes.insert("page".to_string(), page.to_string());
        Self { root }
    }

    /// Serialises the query without an XML declaration.
    pub fn to_xml(&self) -> Result<String, QueryError> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new().write_document_declaration(false);
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| QueryError::MalformedQuery(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| QueryError::MalformedQuery(e.to_string()))
    }
}

impl FromStr for FetchXml {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
