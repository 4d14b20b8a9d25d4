pub mod chunker;
pub mod manifest;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, Module};
use tokio::sync::OnceCell;

use chunker::{parse_chunk_id, SitemapChunker};
use render::{IndexEntry, LastModified, SitemapEntry};

const XML_CONTENT_TYPE: &str = "application/xml";

/// Chunked sitemap documents over the URL manifest.
///
/// The manifest is read once, on first use, and kept for the process
/// lifetime. A manifest that cannot be read is replaced by an empty list.
pub struct SitemapService {
    manifest_path: PathBuf,
    chunk_size: usize,
    site_url: String,
    last_modified: LastModified,
    chunker: OnceCell<Arc<SitemapChunker>>,
}

impl SitemapService {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let sitemap = &settings.sitemap;
        Ok(Self {
            manifest_path: sitemap.manifest_path.clone(),
            chunk_size: sitemap.chunk_size,
            site_url: sitemap.site_url.trim_end_matches('/').to_string(),
            last_modified: LastModified::from_settings(sitemap)?,
            chunker: OnceCell::new(),
        })
    }

    /// Build a service over an already loaded URL list.
    pub fn from_urls(urls: Vec<String>, chunk_size: usize, site_url: &str) -> Self {
        Self {
            manifest_path: PathBuf::new(),
            chunk_size,
            site_url: site_url.trim_end_matches('/').to_string(),
            last_modified: LastModified::Now,
            chunker: OnceCell::new_with(Some(Arc::new(SitemapChunker::new(urls, chunk_size)))),
        }
    }

    pub fn with_last_modified(mut self, last_modified: LastModified) -> Self {
        self.last_modified = last_modified;
        self
    }

    async fn chunker(&self) -> Arc<SitemapChunker> {
        let chunker = self
            .chunker
            .get_or_init(|| async {
                let urls = manifest::load_or_empty(&self.manifest_path).await;
                Arc::new(SitemapChunker::new(urls, self.chunk_size))
            })
            .await;
        Arc::clone(chunker)
    }

    pub async fn total_urls(&self) -> usize {
        self.chunker().await.total_urls()
    }

    pub async fn chunk_count(&self) -> usize {
        self.chunker().await.chunk_count()
    }

    /// Entries of chunk `chunk_id`, empty when out of range.
    pub async fn chunk_entries(&self, chunk_id: usize) -> Vec<SitemapEntry> {
        let chunker = self.chunker().await;
        let last_modified = self.last_modified.resolve();
        chunker
            .chunk(chunk_id)
            .iter()
            .map(|url| SitemapEntry::new(url.as_str(), last_modified))
            .collect()
    }

    /// Render chunk `chunk_id` as a `<urlset>` document.
    pub async fn render_chunk(&self, chunk_id: usize) -> String {
        render::render_urlset(&self.chunk_entries(chunk_id).await)
    }

    /// One entry per chunk id `0..chunk_count`.
    pub async fn index_entries(&self) -> Vec<IndexEntry> {
        let last_modified = self.last_modified.resolve();
        (0..self.chunk_count().await)
            .map(|id| IndexEntry {
                id,
                entry: SitemapEntry::new(
                    format!("{}/sitemap/{}.xml", self.site_url, id),
                    last_modified,
                ),
            })
            .collect()
    }

    pub async fn render_index(&self) -> String {
        render::render_index(&self.index_entries().await)
    }

    pub fn render_robots(&self) -> String {
        render::render_robots(&self.site_url)
    }
}

/// Sitemap documents and robots.txt, mounted at the site root
pub struct SitemapModule {
    service: Arc<SitemapService>,
}

impl SitemapModule {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::with_service(Arc::new(SitemapService::new(settings)?)))
    }

    pub fn with_service(service: Arc<SitemapService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<SitemapService> {
        &self.service
    }
}

#[async_trait]
impl Module for SitemapModule {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    fn base_path(&self) -> String {
        "/".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            manifest = %ctx.settings.sitemap.manifest_path.display(),
            chunk_size = ctx.settings.sitemap.chunk_size,
            last_modified = ?ctx.settings.sitemap.last_modified,
            "sitemap module initialized"
        );
        Ok(())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let chunks = self.service.chunk_count().await;
        tracing::info!(module = self.name(), chunks, "sitemap module started");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/sitemap.xml", get(sitemap_index))
            .route("/sitemap/index.json", get(sitemap_index_json))
            .route("/sitemap/{file}", get(sitemap_chunk))
            .route("/robots.txt", get(robots))
            .with_state(Arc::clone(&self.service))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let xml_ok = serde_json::json!({
            "200": {
                "description": "Sitemap XML document",
                "content": { "application/xml": { "schema": { "type": "string" } } }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/sitemap.xml": {
                    "get": {
                        "summary": "Sitemap index listing every chunk",
                        "tags": ["Sitemap"],
                        "responses": xml_ok.clone()
                    }
                },
                "/sitemap/{file}": {
                    "get": {
                        "summary": "One sitemap chunk, e.g. 0.xml",
                        "tags": ["Sitemap"],
                        "parameters": [{
                            "name": "file",
                            "in": "path",
                            "required": true,
                            "description": "Zero-based chunk id with an optional .xml suffix; unknown ids give an empty urlset",
                            "schema": { "type": "string" }
                        }],
                        "responses": xml_ok
                    }
                },
                "/sitemap/index.json": {
                    "get": {
                        "summary": "Chunk enumeration as JSON",
                        "tags": ["Sitemap"],
                        "responses": {
                            "200": {
                                "description": "One entry per chunk",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/SitemapIndexEntry" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/robots.txt": {
                    "get": {
                        "summary": "Crawler rules",
                        "tags": ["Sitemap"],
                        "responses": {
                            "200": {
                                "description": "robots.txt",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "SitemapIndexEntry": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "url": { "type": "string", "format": "uri" },
                            "lastModified": { "type": "string", "format": "date-time" },
                            "changeFrequency": { "type": "string", "enum": ["monthly"] },
                            "priority": { "type": "number" }
                        },
                        "required": ["id", "url", "lastModified", "changeFrequency", "priority"]
                    }
                }
            }
        }))
    }
}

/// `GET /sitemap.xml`
async fn sitemap_index(State(service): State<Arc<SitemapService>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        service.render_index().await,
    )
}

/// `GET /sitemap/index.json`
async fn sitemap_index_json(State(service): State<Arc<SitemapService>>) -> Json<Vec<IndexEntry>> {
    Json(service.index_entries().await)
}

/// `GET /sitemap/{file}`
async fn sitemap_chunk(
    State(service): State<Arc<SitemapService>>,
    Path(file): Path<String>,
) -> impl IntoResponse {
    let xml = match parse_chunk_id(&file) {
        Some(chunk_id) => service.render_chunk(chunk_id).await,
        None => {
            tracing::debug!(file = %file, "unrecognized sitemap chunk id, serving empty urlset");
            render::render_urlset(&[])
        }
    };

    ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml)
}

/// `GET /robots.txt`
async fn robots(State(service): State<Arc<SitemapService>>) -> String {
    service.render_robots()
}

/// Create a new instance of the sitemap module
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(SitemapModule::new(settings)?))
}
