//! Dynamics 365 CRM data client
//!
//! An async client for the Dynamics 365 / Dataverse Web API that retrieves
//! complete result sets of OData and FetchXML queries, following the
//! service's continuation protocol until the last page.

pub mod api;
pub mod auth;
pub mod error;
pub mod model;
pub mod response;
pub mod transport;

mod client;

pub use api::query::QueryResult;
pub use client::*;
pub use response::Payload;
