//! Query error types

/// Errors raised for caller-supplied queries before any data call is made.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// The FetchXML document is not well-formed XML.
    #[error("Malformed FetchXML query: {0}")]
    MalformedQuery(String),

    /// The FetchXML root has no child element with a `name` attribute.
    #[error("Could not get the name of entity")]
    MissingEntityName,
}
