//! Catalog module: CRUD and search over the book collection.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use shelfd_http::AppError;
use shelfd_kernel::{InitCtx, Module};
use shelfd_store::{Book, BookFilter, BookPatch, BookStatus, CatalogStore, NewBook, SortOrder};

pub struct CatalogModule {
    store: Arc<CatalogStore>,
}

impl CatalogModule {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = self.store.count(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books with optional filter and sort",
                        "tags": ["Catalog"],
                        "parameters": [
                            {"name": "q", "in": "query", "schema": {"type": "string"}},
                            {"name": "category", "in": "query", "schema": {"type": "string"}},
                            {"name": "status", "in": "query", "schema": {"type": "string", "enum": ["available", "issued"]}},
                            {"name": "sort", "in": "query", "schema": {"type": "string", "enum": ["newest_first", "oldest_first", "title", "author"]}}
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {"$ref": "#/components/schemas/Book"}
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Add a book to the catalog",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/NewBook"}
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created book",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/Book"}
                                    }
                                }
                            },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/ErrorResponse"}
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch one book",
                        "tags": ["Catalog"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/Book"}
                                    }
                                }
                            },
                            "404": {
                                "description": "Unknown id",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/ErrorResponse"}
                                    }
                                }
                            }
                        }
                    },
                    "put": {
                        "summary": "Apply a partial update",
                        "tags": ["Catalog"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/BookPatch"}
                                }
                            }
                        },
                        "responses": {
                            "200": {"description": "Updated book"},
                            "404": {"description": "Unknown id"},
                            "422": {"description": "Validation error"}
                        }
                    },
                    "delete": {
                        "summary": "Remove a book",
                        "tags": ["Catalog"],
                        "responses": {
                            "204": {"description": "Deleted"},
                            "404": {"description": "Unknown id"}
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string", "format": "uuid"},
                            "title": {"type": "string"},
                            "author": {"type": "string"},
                            "isbn": {"type": "string"},
                            "category": {"type": "string"},
                            "status": {"type": "string", "enum": ["available", "issued"]},
                            "added_at": {"type": "string", "format": "date-time"},
                            "updated_at": {"type": "string", "format": "date-time"}
                        },
                        "required": ["id", "title", "author", "category", "status", "added_at", "updated_at"]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "author": {"type": "string"},
                            "isbn": {"type": "string"},
                            "category": {"type": "string"}
                        },
                        "required": ["title", "author", "category"]
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "author": {"type": "string"},
                            "isbn": {"type": "string"},
                            "category": {"type": "string"},
                            "status": {"type": "string", "enum": ["available", "issued"]}
                        }
                    }
                }
            }
        }))
    }
}

fn router(store: Arc<CatalogStore>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    q: Option<String>,
    category: Option<String>,
    status: Option<BookStatus>,
    sort: Option<SortOrder>,
}

impl ListQuery {
    fn into_filter(self) -> BookFilter {
        BookFilter {
            query: self.q.filter(|q| !q.trim().is_empty()),
            category: self.category.filter(|c| !c.trim().is_empty()),
            status: self.status,
            sort: self.sort.unwrap_or_default(),
        }
    }
}

async fn list_books(
    State(store): State<Arc<CatalogStore>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Book>> {
    Json(store.list(&query.into_filter()))
}

async fn create_book(
    State(store): State<Arc<CatalogStore>>,
    Json(new): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = store.create(new)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(store.get(id)?))
}

async fn update_book(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(store.update(id, patch)?))
}

async fn delete_book(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a new instance of the catalog module.
pub fn create_module(store: Arc<CatalogStore>) -> Arc<dyn Module> {
    Arc::new(CatalogModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn temp_router() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CatalogStore::open(dir.path().join("library.json")).unwrap());
        (dir, router(store))
    }

    fn create_request(title: &str) -> Request<Body> {
        let body = serde_json::json!({
            "title": title,
            "author": "Frank Herbert",
            "category": "Sci-Fi"
        });
        Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_then_list_contains_the_book() {
        let (_dir, router) = temp_router();

        let response = router
            .clone()
            .oneshot(create_request("Dune"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["title"], "Dune");
        assert_eq!(created["status"], "available");

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["title"], "Dune");
    }

    #[tokio::test]
    async fn blank_title_yields_422() {
        let (_dir, router) = temp_router();

        let response = router.oneshot(create_request("  ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_id_yields_404() {
        let (_dir, router) = temp_router();
        let missing = Uuid::new_v4();

        let response = router
            .oneshot(
                Request::get(format!("/{missing}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get_yields_404() {
        let (_dir, router) = temp_router();

        let response = router
            .clone()
            .oneshot(create_request("Dune"))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::delete(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(Request::get(format!("/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_filter_returns_only_matches() {
        let (_dir, router) = temp_router();

        let response = router
            .clone()
            .oneshot(create_request("Dune"))
            .await
            .unwrap();
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let patch = serde_json::json!({"status": "issued"});
        let response = router
            .clone()
            .oneshot(
                Request::put(format!("/{id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(patch.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(
                Request::get("/?status=available")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert!(listed.as_array().unwrap().is_empty());

        let response = router
            .oneshot(Request::get("/?status=issued").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }
}
