//! Structured (OData) query retrieval.

use std::time::Instant;

use super::Decoded;
use super::Page;
use super::QueryResult;
use crate::D365Client;
use crate::api::Prefer;
use crate::api::data_headers;
use crate::error::Error;

impl D365Client {
    /// Retrieves every row of an OData query.
    ///
    /// `query` is either relative to the data endpoint
    /// (`contacts?$select=fullname`, `accounts(<guid>)`) or an absolute URL
    /// that already contains `/api/data/<version>/`. Pages are requested with
    /// `Prefer: odata.maxpagesize=<page size>` and `@odata.nextLink` is
    /// followed until the latest page no longer carries one.
    ///
    /// A first page without a next link is returned as is: its `value`
    /// records, its non-list `value`, or the whole body when there is no
    /// `value` at all.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let rows = client.get_rows("contacts?$select=fullname").await?;
    /// for record in rows.records().unwrap_or_default() {
    ///     println!("{:?}", record.get_string("fullname"));
    /// }
    /// ```
    pub async fn get_rows(&self, query: &str) -> Result<QueryResult, Error> {
        self.within_deadline(self.collect_odata_pages(query)).await
    }

    /// Resolves a query string against the data endpoint.
    pub(crate) fn resolve_query_url(&self, query: &str) -> String {
        if query.contains(&self.api_path()) {
            query.to_string()
        } else {
            format!("{}{}", self.data_url(), query)
        }
    }

    async fn collect_odata_pages(&self, query: &str) -> Result<QueryResult, Error> {
        let started = Instant::now();
        let token = self.acquire_token().await?;
        let headers = data_headers(&token, Some(Prefer::MaxPageSize(self.page_size())))?;
        let url = self.resolve_query_url(query);

        log::debug!("Page 1: {}", url);
        let page = match Page::decode(self.get(&url, &headers).await?)? {
            Decoded::Page(page) => page,
            Decoded::Final(result) => return Ok(result),
        };

        let Some(mut next_link) = page.next_link().map(str::to_string) else {
            return Ok(QueryResult::Records(page.into_records()));
        };

        let mut records = page.into_records();
        let mut page_number = 1;

        loop {
            page_number += 1;
            log::debug!("Page {}", page_number);

            let page = Page::decode_continuation(self.get(&next_link, &headers).await?)?;
            // the latest page decides whether there is more
            let next = page.next_link().map(str::to_string);
            records.extend(page.into_records());

            match next {
                Some(link) => next_link = link,
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
