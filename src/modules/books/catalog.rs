//! Cached, paginated view over the remote book list.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::OnceCell;

use super::models::{Book, BookRecord, PageEnvelope};
use super::source::BookSource;

/// Number of books served per page.
pub const PAGE_SIZE: usize = 20;

/// Path the page links point at.
const PAGE_LINK_PATH: &str = "/api/books";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The remote book list could not be fetched or decoded.
    #[error("catalog source unavailable: {reason}")]
    SourceUnavailable { reason: String },
}

/// Process-wide book list cache plus the paging logic over it.
///
/// The list is fetched on first use and kept for the lifetime of the
/// catalog. Concurrent first requests share one in-flight fetch; a failed
/// fetch leaves the cache empty so the next request tries again.
pub struct BookCatalog {
    source: Arc<dyn BookSource>,
    books: OnceCell<Arc<Vec<BookRecord>>>,
}

impl BookCatalog {
    pub fn new(source: Arc<dyn BookSource>) -> Self {
        Self {
            source,
            books: OnceCell::new(),
        }
    }

    /// Whether the book list has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.books.initialized()
    }

    /// The full book list, fetching it if this is the first call.
    pub async fn books(&self) -> Result<Arc<Vec<BookRecord>>, CatalogError> {
        let books = self
            .books
            .get_or_try_init(|| async {
                let started = Instant::now();
                match self.source.fetch().await {
                    Ok(books) => {
                        tracing::info!(
                            source = %self.source.describe(),
                            count = books.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "book catalog loaded"
                        );
                        Ok(Arc::new(books))
                    }
                    Err(err) => {
                        tracing::error!(
                            source = %self.source.describe(),
                            error = %err,
                            "book catalog fetch failed"
                        );
                        Err(err)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(books))
    }

    /// Serve 1-based page `page` of the catalog.
    pub async fn page(&self, page: PageNumber) -> Result<PageEnvelope, CatalogError> {
        let books = self.books().await?;
        Ok(paginate(&books, page))
    }
}

/// A validated 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageNumber(usize);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// Returns `None` for page zero.
    pub fn new(page: usize) -> Option<Self> {
        (page >= 1).then_some(Self(page))
    }

    /// Parse a raw query value.
    ///
    /// Missing, non-numeric, zero, negative, and overflowing values all
    /// normalize to the first page.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<usize>().ok())
            .and_then(Self::new)
            .unwrap_or(Self::FIRST)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

fn page_link(page: usize) -> String {
    format!("{}?page={}", PAGE_LINK_PATH, page)
}

/// Slice one page out of `books` and build its envelope.
pub fn paginate(books: &[BookRecord], page: PageNumber) -> PageEnvelope {
    let page = page.get();
    let count = books.len();
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    let end = start.saturating_add(PAGE_SIZE);

    let items = books
        .get(start.min(count)..end.min(count))
        .unwrap_or_default()
        .iter()
        .map(Book::from)
        .collect();

    PageEnvelope {
        count,
        next: (end < count).then(|| page_link(page + 1)),
        previous: (page > 1).then(|| page_link(page - 1)),
        page,
        page_size: PAGE_SIZE,
        books: items,
    }
}
