//! FetchXML query retrieval.

use std::time::Instant;

use super::FetchXml;
use super::PagingCookie;
use crate::D365Client;
use crate::api::Prefer;
use crate::api::data_headers;
use crate::api::query::Decoded;
use crate::api::query::Page;
use crate::api::query::QueryResult;
use crate::error::Error;

impl D365Client {
    /// Retrieves every row of a FetchXML query.
    ///
    /// The query is sent to `<data endpoint><entity>s?fetchXml=<encoded xml>`
    /// with `Prefer: odata.include-annotations=*`. While the latest page
    /// carries a paging cookie annotation, the next page is requested with
    /// that page's cookie, `count` set to the page size and `page` set to
    /// 2, 3, ... on a fresh copy of the query.
    ///
    /// A first page without a paging cookie is returned as is, like
    /// [`D365Client::get_rows`] does.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let rows = client.fetch_xml(r#"
    ///     <fetch mapping="logical">
    ///       <entity name="account"><attribute name="name" /></entity>
    ///     </fetch>"#).await?;
    /// ```
    pub async fn fetch_xml(&self, fetchxml: &str) -> Result<QueryResult, Error> {
        self.within_deadline(self.collect_fetchxml_pages(fetchxml)).await
    }

    /// Builds the request URL for one serialised query.
    pub(crate) fn fetchxml_url(&self, query: &FetchXml) -> Result<String, Error> {
        Ok(format!(
            "{}{}?fetchXml={}",
            self.data_url(),
            query.entity_set_name()?,
            urlencoding::encode(&query.to_xml()?)
        ))
    }

    async fn collect_fetchxml_pages(&self, fetchxml: &str) -> Result<QueryResult, Error> {
        let started = Instant::now();
        let query = FetchXml::parse(fetchxml)?;
        let url = self.fetchxml_url(&query)?;

        let token = self.acquire_token().await?;
        let headers = data_headers(&token, Some(Prefer::IncludeAnnotations))?;

        log::debug!("Page 1: {} query", query.entity_name()?);
        let page = match Page::decode(self.get(&url, &headers).await?)? {
            Decoded::Page(page) => page,
            Decoded::Final(result) => return Ok(result),
        };

        let Some(mut annotation) = next_cookie(&page) else {
            return Ok(QueryResult::Records(page.into_records()));
        };

        let mut records = page.into_records();
        let mut page_number: u32 = 2;

        loop {
            let cookie = PagingCookie::from_annotation(&annotation)?;
            let paged = query.with_paging(cookie.as_str(), self.page_size(), page_number);
            let url = self.fetchxml_url(&paged)?;

            log::debug!("Page {}", page_number);
            let page = Page::decode_continuation(self.get(&url, &headers).await?)?;
            let next = next_cookie(&page);
            records.extend(page.into_records());

            match next {
                Some(next) => {
                    annotation = next;
                    page_number += 1;
                }
                None => break,
            }
        }

        log::info!(
            "Retrieved {} rows in {} pages ({:.2?})",
            records.len(),
            page_number,
            started.elapsed()
        );

        Ok(QueryResult::Records(records))
    }
}

/// The cookie annotation of a page that has a successor.
///
/// An explicit `morerecords=false` ends paging even when a cookie is present.
fn next_cookie(page: &Page) -> Option<String> {
    if page.more_records() == Some(false) {
        return None;
    }
    page.paging_cookie().map(str::to_string)
}
