//! Server-rendered admin views: catalog, search/manage, assistant, dashboard.
//!
//! Single-operator UI with no login. Pages are plain HTML built with small
//! escaping helpers; form posts redirect back with a flash message so a
//! refresh never repeats an action. Service failures render as banners.

mod pages;

use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use shelfd_ollama::{OllamaClient, RecommendationPrompt};
use shelfd_store::{BookFilter, BookPatch, BookStatus, CatalogStore, NewBook, StoreError};

use crate::modules::assistant::catalog_summary;
use crate::modules::dashboard::compute_metrics;
use pages::{urlencode, Flash};

#[derive(Clone)]
struct UiState {
    store: Arc<CatalogStore>,
    ollama: Arc<OllamaClient>,
}

/// Build the root-mounted UI router.
pub fn router(store: Arc<CatalogStore>, ollama: Arc<OllamaClient>) -> Router {
    Router::new()
        .route("/", get(catalog_page))
        .route("/books", post(add_book))
        .route("/books/{id}/status", post(set_status))
        .route("/books/{id}/delete", post(delete_book))
        .route("/search", get(search_page))
        .route("/assistant", get(assistant_page).post(ask_assistant))
        .route("/dashboard", get(dashboard_page))
        .with_state(UiState { store, ollama })
}

#[derive(Debug, Deserialize)]
struct FlashQuery {
    flash: Option<String>,
    error: Option<String>,
}

impl FlashQuery {
    fn into_flash(self) -> Option<Flash> {
        if let Some(message) = self.error {
            Some(Flash::error(message))
        } else {
            self.flash.map(Flash::notice)
        }
    }
}

async fn catalog_page(
    State(state): State<UiState>,
    Query(query): Query<FlashQuery>,
) -> Html<String> {
    let books = state.store.list(&BookFilter::default());
    Html(pages::catalog(&books, query.into_flash()))
}

#[derive(Debug, Deserialize)]
struct AddBookForm {
    title: String,
    author: String,
    #[serde(default)]
    isbn: String,
    category: String,
}

async fn add_book(State(state): State<UiState>, Form(form): Form<AddBookForm>) -> Redirect {
    let new = NewBook {
        title: form.title,
        author: form.author,
        isbn: (!form.isbn.trim().is_empty()).then_some(form.isbn),
        category: form.category,
    };

    match state.store.create(new) {
        Ok(book) => Redirect::to(&format!(
            "/?flash={}",
            urlencode(&format!("Added '{}'", book.title))
        )),
        Err(err) => Redirect::to(&format!("/?error={}", urlencode(&err.to_string()))),
    }
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: BookStatus,
    #[serde(default)]
    q: String,
}

async fn set_status(
    State(state): State<UiState>,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let back = format!("/search?q={}", urlencode(&form.q));
    match state.store.update(id, BookPatch::status(form.status)) {
        Ok(book) => Redirect::to(&format!(
            "{back}&flash={}",
            urlencode(&format!("'{}' marked {}", book.title, book.status.as_str()))
        )),
        Err(err) => Redirect::to(&format!("{back}&error={}", urlencode(&describe(err)))),
    }
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(default)]
    q: String,
}

async fn delete_book(
    State(state): State<UiState>,
    Path(id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let back = format!("/search?q={}", urlencode(&form.q));
    match state.store.delete(id) {
        Ok(()) => Redirect::to(&format!("{back}&flash={}", urlencode("Book deleted"))),
        Err(err) => Redirect::to(&format!("{back}&error={}", urlencode(&describe(err)))),
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    flash: Option<String>,
    error: Option<String>,
}

async fn search_page(State(state): State<UiState>, Query(query): Query<SearchQuery>) -> Html<String> {
    let results = if query.q.trim().is_empty() {
        Vec::new()
    } else {
        state.store.list(&BookFilter {
            query: Some(query.q.clone()),
            ..BookFilter::default()
        })
    };

    let flash = FlashQuery {
        flash: query.flash,
        error: query.error,
    }
    .into_flash();

    Html(pages::search(&query.q, &results, flash))
}

async fn assistant_page() -> Html<String> {
    Html(pages::assistant("", None, None))
}

#[derive(Debug, Deserialize)]
struct AskForm {
    query: String,
}

async fn ask_assistant(State(state): State<UiState>, Form(form): Form<AskForm>) -> Response {
    if form.query.trim().is_empty() {
        let flash = Flash::error("Tell the assistant what you feel like reading first.");
        return Html(pages::assistant("", None, Some(flash))).into_response();
    }

    let mut prompt = RecommendationPrompt::new(form.query.trim());
    if let Some(summary) = catalog_summary(&state.store) {
        prompt = prompt.with_catalog_summary(summary);
    }

    match state.ollama.recommend(&prompt).await {
        Ok(text) => Html(pages::assistant(&form.query, Some(&text), None)).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "recommendation request failed");
            let flash = Flash::error(format!("The assistant is unavailable: {err}"));
            Html(pages::assistant(&form.query, None, Some(flash))).into_response()
        }
    }
}

async fn dashboard_page(State(state): State<UiState>) -> Html<String> {
    let metrics = compute_metrics(&state.store);
    Html(pages::dashboard(&metrics))
}

fn describe(err: StoreError) -> String {
    match err {
        StoreError::NotFound(_) => "That book no longer exists".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn temp_router() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CatalogStore::open(dir.path().join("library.json")).unwrap());
        // Nothing listens on the discard port.
        let ollama = Arc::new(
            OllamaClient::new("http://127.0.0.1:9", "llama3.2", Duration::from_secs(2)).unwrap(),
        );
        (dir, router(store, ollama))
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn catalog_page_renders_added_book() {
        let (_dir, router) = temp_router();

        let response = router
            .clone()
            .oneshot(
                Request::post("/books")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "title=Dune&author=Frank+Herbert&isbn=&category=Sci-Fi",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Dune"));
        assert!(html.contains("Frank Herbert"));
    }

    #[tokio::test]
    async fn blank_title_redirects_with_error() {
        let (_dir, router) = temp_router();

        let response = router
            .oneshot(
                Request::post("/books")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("title=++&author=Nobody&isbn=&category=Fiction"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("/?error="));
    }

    #[tokio::test]
    async fn assistant_failure_renders_banner_not_crash() {
        let (_dir, router) = temp_router();

        let response = router
            .oneshot(
                Request::post("/assistant")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("query=something+with+dragons"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("unavailable"));
    }

    #[tokio::test]
    async fn dashboard_page_renders_totals() {
        let (_dir, router) = temp_router();

        let response = router
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Total books"));
    }

    #[tokio::test]
    async fn search_page_escapes_user_input() {
        let (_dir, router) = temp_router();

        let response = router
            .oneshot(
                Request::get("/search?q=%3Cscript%3E")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
