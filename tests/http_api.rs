//! Integration tests for the assembled application router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use shelf_app::modules::books::catalog::CatalogError;
use shelf_app::modules::books::models::BookRecord;
use shelf_app::modules::books::source::BookSource;
use shelf_app::modules::books::BooksModule;
use shelf_app::modules::sitemap::{SitemapModule, SitemapService};
use shelf_kernel::settings::Settings;
use shelf_kernel::ModuleRegistry;
use tower::ServiceExt;

struct MemorySource {
    books: Vec<BookRecord>,
    fetches: AtomicUsize,
    available: bool,
}

impl MemorySource {
    fn with_books(n: u64) -> Self {
        Self {
            books: (1..=n)
                .map(|id| BookRecord {
                    id,
                    title: format!("Volume {}: The Sequel!", id),
                    description: format!("Description {}", id),
                    image_url: format!("https://cdn.example.com/{}.jpg", id),
                    download_count: id,
                    pdf_url: format!("https://cdn.example.com/{}.pdf", id),
                })
                .collect(),
            fetches: AtomicUsize::new(0),
            available: true,
        }
    }

    fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_books(0)
        }
    }
}

#[async_trait]
impl BookSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<BookRecord>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(self.books.clone())
        } else {
            Err(CatalogError::SourceUnavailable {
                reason: "source answered with status 500 Internal Server Error".to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn app_with(source: Arc<MemorySource>, urls: Vec<String>, chunk_size: usize) -> Router {
    let settings = Settings::default();
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(BooksModule::with_source(source)));
    registry.register(Arc::new(SitemapModule::with_service(Arc::new(
        SitemapService::from_urls(urls, chunk_size, "https://books.example.com"),
    ))));
    shelf_http::build_router(&registry, &settings)
}

fn urls(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("https://books.example.com/book/{}", i))
        .collect()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_catalog_pages_for_forty_five_books() {
    let source = Arc::new(MemorySource::with_books(45));
    let app = app_with(source.clone(), Vec::new(), 45_000);

    let (status, first) = get_json(&app, "/api/books?page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 45);
    assert_eq!(first["page"], 1);
    assert_eq!(first["pageSize"], 20);
    assert_eq!(first["books"].as_array().unwrap().len(), 20);
    assert_eq!(first["next"], "/api/books?page=2");
    assert!(first["previous"].is_null());
    assert_eq!(first["books"][0]["slug"], "1-volume-1-the-sequel");
    assert_eq!(first["books"][0]["image"], "https://cdn.example.com/1.jpg");
    assert_eq!(first["books"][0]["pdf"], "https://cdn.example.com/1.pdf");

    let (_, last) = get_json(&app, "/api/books?page=3").await;
    assert_eq!(last["books"].as_array().unwrap().len(), 5);
    assert!(last["next"].is_null());
    assert_eq!(last["previous"], "/api/books?page=2");

    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_page_defaults_to_first() {
    let app = app_with(Arc::new(MemorySource::with_books(45)), Vec::new(), 45_000);

    for uri in [
        "/api/books",
        "/api/books?page=",
        "/api/books?page=abc",
        "/api/books?page=0",
        "/api/books?page=-2",
        "/api/books?page=abc&page=3",
    ] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["page"], 1, "{}", uri);
    }
}

#[tokio::test]
async fn test_repeated_page_key_uses_first_value() {
    let app = app_with(Arc::new(MemorySource::with_books(45)), Vec::new(), 45_000);

    let (status, body) = get_json(&app, "/api/books?page=3&page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 3);
    assert_eq!(body["books"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let app = app_with(Arc::new(MemorySource::with_books(45)), Vec::new(), 45_000);

    let (status, body) = get_json(&app, "/api/books?page=99").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["books"].as_array().unwrap().is_empty());
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], "/api/books?page=98");
}

#[tokio::test]
async fn test_unavailable_source_is_a_503_and_retried() {
    let source = Arc::new(MemorySource::unavailable());
    let app = app_with(source.clone(), Vec::new(), 45_000);

    let (status, body) = get_json(&app, "/api/books?page=1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "source_unavailable");

    let (status, _) = get_json(&app, "/api/books?page=1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sitemap_chunks_and_index() {
    let app = app_with(Arc::new(MemorySource::with_books(0)), urls(5), 2);

    let (status, content_type, index) = get(&app, "/sitemap.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert_eq!(index.matches("<sitemap>").count(), 3);
    assert!(index.contains("<loc>https://books.example.com/sitemap/2.xml</loc>"));

    let (status, content_type, chunk) = get(&app, "/sitemap/1.xml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert_eq!(chunk.matches("<url>").count(), 2);
    assert!(chunk.contains("<loc>https://books.example.com/book/2</loc>"));
    assert!(chunk.contains("<loc>https://books.example.com/book/3</loc>"));
    assert!(chunk.contains("<changefreq>monthly</changefreq>"));
    assert!(chunk.contains("<priority>0.8</priority>"));

    let (_, _, last) = get(&app, "/sitemap/2.xml").await;
    assert_eq!(last.matches("<url>").count(), 1);

    let (status, entries) = get_json(&app, "/sitemap/index.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 3);
    assert_eq!(entries[1]["id"], 1);
    assert_eq!(entries[1]["changeFrequency"], "monthly");
}

#[tokio::test]
async fn test_unknown_sitemap_chunks_are_empty_documents() {
    let app = app_with(Arc::new(MemorySource::with_books(0)), urls(5), 2);

    for uri in ["/sitemap/3.xml", "/sitemap/abc.xml", "/sitemap/-1.xml"] {
        let (status, content_type, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(content_type.as_deref(), Some("application/xml"));
        assert!(body.contains("<urlset"), "{}", uri);
        assert!(!body.contains("<url>"), "{}", uri);
    }
}

#[tokio::test]
async fn test_robots_health_docs_and_fallback() {
    let app = app_with(Arc::new(MemorySource::with_books(0)), urls(1), 2);

    let (status, _, robots) = get(&app, "/robots.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert!(robots.contains("Sitemap: https://books.example.com/sitemap.xml"));

    let (status, _, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, "ok");

    let (status, docs) = get_json(&app, "/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(docs["paths"]["/api/books"]["get"].is_object());
    assert!(docs["paths"]["/sitemap/{file}"]["get"].is_object());

    let (status, _, swagger_doc) = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let swagger_doc: utoipa::openapi::OpenApi = serde_json::from_str(&swagger_doc).unwrap();
    assert!(swagger_doc.paths.paths.contains_key("/api/books"));
    assert!(swagger_doc.paths.paths.contains_key("/robots.txt"));
    let schemas = swagger_doc.components.unwrap().schemas;
    assert!(schemas.contains_key("BookPage"));
    assert!(schemas.contains_key("SitemapIndexEntry"));

    let (status, missing) = get_json(&app, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"]["code"], "not_found");
}
