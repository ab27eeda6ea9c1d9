//! Access to the external test-management service.
//!
//! The service exposes two paginated list operations: all sections of a
//! project, and the cases of one section. [`TestSource`] is the seam the
//! rest of the crate talks to; [`http::HttpTestSource`] is the production
//! implementation and tests substitute in-memory sources.

pub mod http;

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::{CoverageError, Result};
use crate::types::{Section, TestCase};

pub use http::{unwrap_collection, HttpTestSource};

/// Largest page the upstream service will return.
pub const MAX_PAGE_SIZE: usize = 250;

/// Upper bound on pages fetched for one listing, in case the service ignores
/// the offset and keeps returning full pages.
const MAX_PAGES: usize = 10_000;

/// One page-at-a-time view of the upstream service.
pub trait TestSource: Send + Sync {
    /// Fetch up to `limit` sections starting at `offset`.
    fn sections_page(&self, offset: usize, limit: usize) -> BoxFuture<'_, Result<Vec<Section>>>;

    /// Fetch up to `limit` cases of `section_id` starting at `offset`.
    fn cases_page(
        &self,
        section_id: i64,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<TestCase>>>;
}

/// Drive a paginated listing to exhaustion.
///
/// Requests pages of `page_size` (clamped to `1..=250`) while each returned
/// page is full, and stops after the first partial or empty page.
pub async fn fetch_all_pages<T, F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let limit = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut all = Vec::new();
    let mut offset = 0;

    for _ in 0..MAX_PAGES {
        let batch = fetch(offset, limit).await?;
        let received = batch.len();
        all.extend(batch);
        if received < limit {
            return Ok(all);
        }
        offset += received;
    }

    Err(CoverageError::upstream(
        "pagination",
        format!("offset {offset}"),
        format!("listing did not terminate after {MAX_PAGES} full pages"),
    ))
}

/// Fetch every section of the configured project.
pub async fn fetch_sections(source: &dyn TestSource, page_size: usize) -> Result<Vec<Section>> {
    fetch_all_pages(page_size, |offset, limit| source.sections_page(offset, limit)).await
}

/// Fetch every case of one section.
pub async fn fetch_cases(
    source: &dyn TestSource,
    section_id: i64,
    page_size: usize,
) -> Result<Vec<TestCase>> {
    fetch_all_pages(page_size, |offset, limit| {
        source.cases_page(section_id, offset, limit)
    })
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
