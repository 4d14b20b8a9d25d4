//! Sitemap XML and robots.txt rendering.

use quick_xml::escape::escape;
use serde::Serialize;
use shelf_kernel::settings::{LastModifiedPolicy, SitemapSettings};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// How often search engines are told a page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Monthly,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

pub const DEFAULT_CHANGE_FREQUENCY: ChangeFrequency = ChangeFrequency::Monthly;
pub const DEFAULT_PRIORITY: f64 = 0.8;

/// Source of `<lastmod>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastModified {
    /// Stamp with the time of rendering.
    Now,
    /// Stamp with a fixed instant.
    At(OffsetDateTime),
}

impl LastModified {
    /// Resolve the configured policy. `startup` pins the current time.
    pub fn from_settings(settings: &SitemapSettings) -> anyhow::Result<Self> {
        Ok(match settings.last_modified {
            LastModifiedPolicy::Request => LastModified::Now,
            LastModifiedPolicy::Startup => LastModified::At(OffsetDateTime::now_utc()),
            LastModifiedPolicy::Fixed => LastModified::At(settings.fixed_timestamp()?),
        })
    }

    pub fn resolve(self) -> OffsetDateTime {
        match self {
            LastModified::Now => OffsetDateTime::now_utc(),
            LastModified::At(at) => at,
        }
    }
}

/// One `<url>` of a sitemap document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
}

impl SitemapEntry {
    pub fn new(url: impl Into<String>, last_modified: OffsetDateTime) -> Self {
        Self {
            url: url.into(),
            last_modified,
            change_frequency: DEFAULT_CHANGE_FREQUENCY,
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// One chunk as listed in the sitemap index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub id: usize,
    #[serde(flatten)]
    pub entry: SitemapEntry,
}

fn w3c_datetime(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .replace_nanosecond(0)
        .unwrap_or(at)
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.date().to_string())
}

/// Render a `<urlset>` document. An empty slice yields a valid empty set.
pub fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 160);
    xml.push_str(XML_HEADER);
    xml.push_str(&format!("\n<urlset xmlns=\"{}\">\n", SITEMAP_NS));
    for entry in entries {
        xml.push_str(&format!(
            "  <url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{}</changefreq><priority>{:.1}</priority></url>\n",
            escape(entry.url.as_str()),
            w3c_datetime(entry.last_modified),
            entry.change_frequency.as_str(),
            entry.priority,
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Render a `<sitemapindex>` document pointing at each chunk.
pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut xml = String::with_capacity(128 + entries.len() * 128);
    xml.push_str(XML_HEADER);
    xml.push_str(&format!("\n<sitemapindex xmlns=\"{}\">\n", SITEMAP_NS));
    for IndexEntry { entry, .. } in entries {
        xml.push_str(&format!(
            "  <sitemap><loc>{}</loc><lastmod>{}</lastmod></sitemap>\n",
            escape(entry.url.as_str()),
            w3c_datetime(entry.last_modified),
        ));
    }
    xml.push_str("</sitemapindex>\n");
    xml
}

/// Render robots.txt allowing everything but `/private/`.
pub fn render_robots(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /private/\n\nSitemap: {}/sitemap.xml\n",
        site_url.trim_end_matches('/')
    )
}
