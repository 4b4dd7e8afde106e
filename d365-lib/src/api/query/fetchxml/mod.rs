//! FetchXML query support.
//!
//! FetchXML queries page with an opaque cookie instead of a next-page URL:
//! each response carries a paging cookie annotation that must be echoed back,
//! decoded, in the `paging-cookie` attribute of the next request.

mod cookie;
mod document;
mod pages;

pub use cookie::PagingCookie;
pub use document::FetchXml;
