//! Web API operations

mod headers;
pub mod query;

pub(crate) use headers::data_headers;
pub use headers::Prefer;
