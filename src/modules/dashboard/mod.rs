//! Dashboard module: read-only metrics over the catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;

use shelfd_kernel::{InitCtx, Module};
use shelfd_store::{Book, BookFilter, BookStatus, CatalogStore};

/// Cap on the "recently added" and "recently issued" listings.
const RECENT_LIMIT: usize = 5;

pub struct DashboardModule {
    store: Arc<CatalogStore>,
}

impl DashboardModule {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for DashboardModule {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "dashboard module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/metrics": {
                    "get": {
                        "summary": "Catalog metrics for the dashboard",
                        "tags": ["Dashboard"],
                        "responses": {
                            "200": {
                                "description": "Aggregated counts",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/Metrics"}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Metrics": {
                        "type": "object",
                        "properties": {
                            "total_books": {"type": "integer"},
                            "available": {"type": "integer"},
                            "issued": {"type": "integer"},
                            "fill_rate": {"type": "number"},
                            "by_category": {
                                "type": "object",
                                "additionalProperties": {"type": "integer"}
                            },
                            "recently_added": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/Book"}
                            },
                            "recently_issued": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/Book"}
                            }
                        },
                        "required": ["total_books", "available", "issued", "fill_rate", "by_category"]
                    }
                }
            }
        }))
    }
}

/// Aggregated view of the catalog, recomputed on each request.
#[derive(Debug, Serialize)]
pub struct Metrics {
    pub total_books: usize,
    pub available: usize,
    pub issued: usize,
    /// Share of the catalog currently available, as a percentage.
    pub fill_rate: f64,
    pub by_category: BTreeMap<String, usize>,
    pub recently_added: Vec<Book>,
    pub recently_issued: Vec<Book>,
}

/// Compute metrics from the current catalog contents.
pub fn compute_metrics(store: &CatalogStore) -> Metrics {
    let books = store.list(&BookFilter::default());

    let total_books = books.len();
    let available = books
        .iter()
        .filter(|book| book.status == BookStatus::Available)
        .count();
    let issued = total_books - available;

    let fill_rate = if total_books == 0 {
        0.0
    } else {
        available as f64 / total_books as f64 * 100.0
    };

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for book in &books {
        *by_category.entry(book.category.clone()).or_default() += 1;
    }

    // `books` is already newest-first.
    let recently_added = books.iter().take(RECENT_LIMIT).cloned().collect();
    let recently_issued = books
        .iter()
        .filter(|book| book.status == BookStatus::Issued)
        .take(RECENT_LIMIT)
        .cloned()
        .collect();

    Metrics {
        total_books,
        available,
        issued,
        fill_rate,
        by_category,
        recently_added,
        recently_issued,
    }
}

async fn get_metrics(State(store): State<Arc<CatalogStore>>) -> Json<Metrics> {
    Json(compute_metrics(&store))
}

/// Create a new instance of the dashboard module.
pub fn create_module(store: Arc<CatalogStore>) -> Arc<dyn Module> {
    Arc::new(DashboardModule::new(store))
}
