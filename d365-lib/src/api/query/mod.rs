//! Query retrieval for OData and FetchXML.
//!
//! Both query styles return a [`QueryResult`] holding every record of every
//! page. They differ in how the next page is found:
//!
//! - OData follows the absolute `@odata.nextLink` URL of each page.
//! - FetchXML re-sends the query with the page's decoded paging cookie.

pub mod fetchxml;
mod odata;
mod page;
mod result;

pub use fetchxml::FetchXml;
pub use fetchxml::PagingCookie;
pub use page::Page;
pub(crate) use page::Decoded;
pub use result::QueryResult;
