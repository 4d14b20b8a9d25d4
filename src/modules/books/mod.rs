pub mod catalog;
pub mod models;
pub mod slug;
pub mod source;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use shelf_http::error::AppError;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, Module};

use catalog::{BookCatalog, CatalogError, PageNumber};
use models::PageEnvelope;
use source::{BookSource, HttpBookSource};

/// Paginated catalog served from a cached copy of the remote book list
pub struct BooksModule {
    catalog: Arc<BookCatalog>,
}

impl BooksModule {
    /// Build the module against the configured remote source
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let source = HttpBookSource::new(&settings.catalog)?;
        Ok(Self::with_source(Arc::new(source)))
    }

    pub fn with_source(source: Arc<dyn BookSource>) -> Self {
        Self {
            catalog: Arc::new(BookCatalog::new(source)),
        }
    }

    pub fn catalog(&self) -> &Arc<BookCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            source = %ctx.settings.catalog.source_url,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books))
            .route("/health", get(health_check))
            .with_state(Arc::clone(&self.catalog))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List one page of books",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "page",
                            "in": "query",
                            "required": false,
                            "description": "1-based page number; anything that is not a positive integer means page 1",
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "One page of the catalog",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookPage" }
                                    }
                                }
                            },
                            "503": {
                                "description": "The catalog source could not be reached",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "slug": {
                                "type": "string",
                                "description": "URL-friendly slug for the book"
                            },
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "image": { "type": "string", "format": "uri" },
                            "downloads": { "type": "integer", "format": "int64" },
                            "pdf": { "type": "string", "format": "uri" }
                        },
                        "required": ["id", "slug", "title", "description", "image", "downloads", "pdf"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "count": { "type": "integer" },
                            "next": { "type": ["string", "null"] },
                            "previous": { "type": ["string", "null"] },
                            "page": { "type": "integer" },
                            "pageSize": { "type": "integer" },
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["count", "next", "previous", "page", "pageSize", "books"]
                    }
                }
            }
        }))
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::SourceUnavailable { .. } => {
                AppError::unavailable("source_unavailable", err.to_string())
            }
        }
    }
}

/// Health check endpoint
async fn health_check(State(catalog): State<Arc<BookCatalog>>) -> &'static str {
    if catalog.is_loaded() {
        "books module is healthy"
    } else {
        "books module is healthy (catalog not loaded yet)"
    }
}

/// Value of the first `page` key in the query string, if any.
fn first_page_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
}

/// `GET /api/books?page=<n>`
async fn list_books(
    State(catalog): State<Arc<BookCatalog>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<PageEnvelope>, AppError> {
    let raw = match &query {
        Ok(Query(pairs)) => first_page_param(pairs),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unparseable query, serving page 1");
            None
        }
    };
    let page = PageNumber::parse_lenient(raw);

    let envelope = catalog.page(page).await?;
    Ok(Json(envelope))
}

/// Create a new instance of the books module
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    Ok(Arc::new(BooksModule::new(settings)?))
}
