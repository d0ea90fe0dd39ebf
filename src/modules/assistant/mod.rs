//! Assistant module: recommendation requests forwarded to the LLM endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use shelfd_http::AppError;
use shelfd_kernel::{InitCtx, Module};
use shelfd_ollama::{OllamaClient, RecommendationPrompt};
use shelfd_store::{BookFilter, CatalogStore};

pub struct AssistantModule {
    state: AssistantState,
}

#[derive(Clone)]
struct AssistantState {
    ollama: Arc<OllamaClient>,
    store: Arc<CatalogStore>,
}

impl AssistantModule {
    pub fn new(ollama: Arc<OllamaClient>, store: Arc<CatalogStore>) -> Self {
        Self {
            state: AssistantState { ollama, store },
        }
    }
}

#[async_trait]
impl Module for AssistantModule {
    fn name(&self) -> &'static str {
        "assistant"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            model = self.state.ollama.model(),
            "assistant module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/recommend", post(recommend))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/recommend": {
                    "post": {
                        "summary": "Ask the library assistant for a recommendation",
                        "tags": ["Assistant"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/RecommendRequest"}
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Generated recommendation text",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/Recommendation"}
                                    }
                                }
                            },
                            "503": {
                                "description": "LLM endpoint unreachable",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": "#/components/schemas/ErrorResponse"}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RecommendRequest": {
                        "type": "object",
                        "properties": {
                            "query": {"type": "string"}
                        },
                        "required": ["query"]
                    },
                    "Recommendation": {
                        "type": "object",
                        "properties": {
                            "model": {"type": "string"},
                            "text": {"type": "string"}
                        },
                        "required": ["model", "text"]
                    }
                }
            }
        }))
    }
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct Recommendation {
    model: String,
    text: String,
}

async fn recommend(
    State(state): State<AssistantState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<Recommendation>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::validation(
            vec![json!({"field": "query", "error": "required"})],
            "query must not be blank",
        ));
    }

    let mut prompt = RecommendationPrompt::new(request.query.trim());
    if let Some(summary) = catalog_summary(&state.store) {
        prompt = prompt.with_catalog_summary(summary);
    }

    let text = state.ollama.recommend(&prompt).await?;

    Ok(Json(Recommendation {
        model: state.ollama.model().to_string(),
        text,
    }))
}

/// One-line description of the catalog handed to the model as context.
pub fn catalog_summary(store: &CatalogStore) -> Option<String> {
    let books = store.list(&BookFilter::default());
    if books.is_empty() {
        return None;
    }

    let mut by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for book in &books {
        *by_category.entry(book.category.as_str()).or_default() += 1;
    }

    let categories = by_category
        .iter()
        .map(|(category, count)| format!("{category} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "The library catalog currently holds {} books across these categories: {}.",
        books.len(),
        categories
    ))
}

/// Create a new instance of the assistant module.
pub fn create_module(ollama: Arc<OllamaClient>, store: Arc<CatalogStore>) -> Arc<dyn Module> {
    Arc::new(AssistantModule::new(ollama, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    use shelfd_store::NewBook;

    fn temp_store() -> (tempfile::TempDir, Arc<CatalogStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CatalogStore::open(dir.path().join("library.json")).unwrap());
        (dir, store)
    }

    fn unreachable_router(store: Arc<CatalogStore>) -> Router {
        // Nothing listens on the discard port.
        let ollama = Arc::new(
            OllamaClient::new("http://127.0.0.1:9", "llama3.2", Duration::from_secs(2)).unwrap(),
        );
        AssistantModule::new(ollama, store).routes()
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_as_503() {
        let (_dir, store) = temp_store();
        let router = unreachable_router(store);

        let body = serde_json::json!({"query": "I like sci-fi"});
        let response = router
            .oneshot(
                Request::post("/recommend")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "unavailable");
    }

    #[tokio::test]
    async fn blank_query_yields_422_without_calling_the_endpoint() {
        let (_dir, store) = temp_store();
        let router = unreachable_router(store);

        let body = serde_json::json!({"query": "   "});
        let response = router
            .oneshot(
                Request::post("/recommend")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn catalog_summary_counts_categories() {
        let (_dir, store) = temp_store();
        assert!(catalog_summary(&store).is_none());

        store
            .create(NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: None,
                category: "Sci-Fi".to_string(),
            })
            .unwrap();
        store
            .create(NewBook {
                title: "Dune Messiah".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: None,
                category: "Sci-Fi".to_string(),
            })
            .unwrap();

        let summary = catalog_summary(&store).unwrap();
        assert!(summary.contains("2 books"));
        assert!(summary.contains("Sci-Fi (2)"));
    }
}
