//! Loading the URL manifest that backs the sitemap chunks.
//!
//! A manifest is either a JSON array of URL strings or a sitemap XML document
//! whose `<loc>` values are taken in document order. The choice is made from
//! the file extension.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest is not a JSON array of URLs: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest is not readable sitemap XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Supported manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    SitemapXml,
}

impl ManifestFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => ManifestFormat::SitemapXml,
            _ => ManifestFormat::Json,
        }
    }
}

/// Extract every `<loc>` value from a sitemap document in document order.
///
/// Entities are unescaped and CDATA sections are taken verbatim. Comments and
/// processing instructions are skipped.
pub fn extract_locs(xml: &str) -> Result<Vec<String>, ManifestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Event::Text(e) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                if let Some(loc) = current.take() {
                    locs.push(loc.trim().to_string());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locs)
}

/// Decode manifest contents in the given format.
pub fn parse(contents: &str, format: ManifestFormat) -> Result<Vec<String>, ManifestError> {
    match format {
        ManifestFormat::Json => Ok(serde_json::from_str(contents)?),
        ManifestFormat::SitemapXml => extract_locs(contents),
    }
}

/// Read and decode the manifest at `path`.
pub async fn load(path: &Path) -> Result<Vec<String>, ManifestError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse(&contents, ManifestFormat::for_path(path))
}

/// Read the manifest, degrading to an empty list when it is missing or
/// malformed.
pub async fn load_or_empty(path: &Path) -> Vec<String> {
    match load(path).await {
        Ok(urls) => {
            tracing::info!(path = %path.display(), count = urls.len(), "sitemap manifest loaded");
            urls
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "sitemap manifest unreadable, serving empty sitemaps"
            );
            Vec::new()
        }
    }
}

/// Extract the `<loc>` values of a sitemap XML file into a JSON manifest.
///
/// Returns the number of URLs written.
pub async fn convert_xml_to_json(input: &Path, output: &Path) -> Result<usize, ManifestError> {
    let xml = tokio::fs::read_to_string(input).await?;
    let urls = extract_locs(&xml)?;
    tokio::fs::write(output, serde_json::to_vec(&urls)?).await?;
    Ok(urls.len())
}
