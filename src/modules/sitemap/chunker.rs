/// URLs per sitemap document.
pub const URLS_PER_SITEMAP: usize = 45_000;

/// Splits an ordered URL list into fixed-size, independently addressable
/// chunks.
#[derive(Debug, Clone)]
pub struct SitemapChunker {
    urls: Vec<String>,
    chunk_size: usize,
}

impl SitemapChunker {
    /// `chunk_size` of zero is treated as one.
    pub fn new(urls: Vec<String>, chunk_size: usize) -> Self {
        Self {
            urls,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn total_urls(&self) -> usize {
        self.urls.len()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks needed to cover every URL.
    pub fn chunk_count(&self) -> usize {
        self.urls.len().div_ceil(self.chunk_size)
    }

    /// URLs of chunk `chunk_id`; empty when the id is out of range.
    pub fn chunk(&self, chunk_id: usize) -> &[String] {
        let total = self.urls.len();
        let start = chunk_id.saturating_mul(self.chunk_size).min(total);
        let end = start.saturating_add(self.chunk_size).min(total);
        &self.urls[start..end]
    }
}

/// Parse a routed chunk identifier such as `"3.xml"` or `"3"`.
///
/// Returns `None` for anything that is not a non-negative integer once the
/// `.xml` suffix is removed.
pub fn parse_chunk_id(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".xml").unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
