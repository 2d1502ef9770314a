//! Pagination and batching helpers shared by every listing operation.
//!
//! Two loops live here:
//!
//! - [`query_ids`] — repeatedly calls a query endpoint with a fixed page
//!   size and an increasing offset until the accumulated count reaches the
//!   server-reported total.
//! - [`fetch_in_batches`] — partitions a list of entity IDs into chunks of
//!   at most the API's per-call limit and concatenates the per-chunk
//!   results in order.
//!
//! The query runner carries a deliberate workaround: some endpoints report
//! `offset: 0` on a follow-up page instead of advancing it. A literal
//! offset of 0 after the first page would either terminate early or loop
//! forever depending on interpretation, so the runner treats it as "no more
//! pages" and substitutes the learned total to exit the loop. The upstream
//! behavior cannot be changed; do not "fix" this here.

use std::future::Future;

use crate::client::FalconClient;
use crate::error::Result;

/// Page size for query endpoints.
pub const PAGE_SIZE: u64 = 100;

/// Maximum number of IDs per detail-lookup call.
pub const BATCH_SIZE: usize = 100;

/// Runs a paginated ID query to completion and returns every resource ID.
///
/// Calls `GET {path}` with `limit`/`offset` plus the optional `filter` and
/// `sort` expressions, accumulating `resources` until the count reaches the
/// total reported in `meta.pagination`. A response without a pagination
/// block ends the loop after its page.
pub async fn query_ids(
    client: &FalconClient,
    path: &str,
    filter: Option<&str>,
    sort: Option<&str>,
) -> Result<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    let mut total: u64 = 1;
    let mut offset: u64 = 0;

    while offset < total {
        let mut query: Vec<(&str, String)> = vec![
            ("limit", PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(f) = filter {
            query.push(("filter", f.to_string()));
        }
        if let Some(s) = sort {
            query.push(("sort", s.to_string()));
        }

        let resp = client.get::<String>(path, &query).await?;
        items.extend(resp.resources);

        match resp.meta.pagination {
            Some(page) => {
                total = page.total;
                offset = page.offset;
                // Offset-reset quirk: a returned offset of 0 means "no more
                // pages", not "start over". Substitute the learned total so
                // the loop condition fails.
                if offset == 0 {
                    offset = total;
                }
            }
            None => break,
        }
    }

    Ok(items)
}

/// Fetches details for an ID list larger than the per-call limit.
///
/// Partitions `ids` into consecutive chunks of at most `batch_size` and
/// invokes `fetch` once per chunk, concatenating results in chunk order.
/// An empty list still produces exactly one call with an empty chunk, so
/// callers observe a uniform "one response per ceil(N/batch) calls, minimum
/// one" contract.
pub async fn fetch_in_batches<T, F, Fut>(
    ids: &[String],
    batch_size: usize,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if ids.is_empty() {
        return fetch(Vec::new()).await;
    }

    let mut details = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(batch_size) {
        details.extend(fetch(chunk.to_vec()).await?);
    }

    Ok(details)
}
