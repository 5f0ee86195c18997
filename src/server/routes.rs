use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::extract::{JsonBody, PathParam, QueryParams};
use crate::catalog::{Catalog, CatalogError, IndexStatus};
use crate::models::{IndexedItem, Item, ItemInput};
use crate::sync::SearchOutcome;

/// Header set on search responses when index sync is turned off, so an empty
/// list can be told apart from "no matches".
pub const SEARCH_INDEX_HEADER: &str = "x-search-index";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

/// Builds the router for all catalog endpoints.
pub fn router(catalog: Catalog) -> Router {
    let state = AppState { catalog };

    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items).post(create_item))
        .route("/items/ping", get(ping))
        .route("/items/search", get(search_items))
        .route("/items/reindex", get(reindex).post(reindex))
        .route("/items/index/status", get(index_status))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/items/{id}/decrement", post(decrement_item))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ping() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct ItemFilter {
    name: Option<String>,
    category: Option<String>,
}

async fn list_items(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ItemFilter>,
) -> Result<Json<Vec<Item>>, CatalogError> {
    let items = state
        .catalog
        .list(filter.name.as_deref(), filter.category.as_deref())
        .await?;
    Ok(Json(items))
}

async fn get_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Item>, CatalogError> {
    Ok(Json(state.catalog.get(id).await?))
}

async fn create_item(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ItemInput>,
) -> Result<Json<Item>, CatalogError> {
    Ok(Json(state.catalog.create(input).await?))
}

async fn update_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(input): JsonBody<ItemInput>,
) -> Result<Json<Item>, CatalogError> {
    Ok(Json(state.catalog.update(id, input).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, CatalogError> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct DecrementParams {
    #[serde(default = "default_qty")]
    qty: i64,
}

fn default_qty() -> i64 {
    1
}

async fn decrement_item(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    QueryParams(params): QueryParams<DecrementParams>,
) -> Result<Json<Item>, CatalogError> {
    Ok(Json(state.catalog.decrement(id, params.qty).await?))
}

async fn search_items(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ItemFilter>,
) -> Response {
    let outcome = state
        .catalog
        .search(filter.name.as_deref(), filter.category.as_deref())
        .await;

    match outcome {
        SearchOutcome::Disabled => (
            [(SEARCH_INDEX_HEADER, "disabled")],
            Json(Vec::<IndexedItem>::new()),
        )
            .into_response(),
        SearchOutcome::Results(docs) => Json(docs).into_response(),
    }
}

/// Reindex response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub reindexed: u64,
}

async fn reindex(State(state): State<AppState>) -> Json<ReindexResponse> {
    Json(ReindexResponse {
        reindexed: state.catalog.reindex().await,
    })
}

async fn index_status(State(state): State<AppState>) -> Result<Json<IndexStatus>, CatalogError> {
    Ok(Json(state.catalog.status().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, ItemRepository};
    use crate::search::InMemoryIndex;
    use crate::server::ErrorBody;
    use crate::sync::IndexSync;
    use axum::body::Body;
    use axum::http::{header, HeaderMap, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestContext {
        app: Router,
        _temp_dir: TempDir,
    }

    async fn setup_with(enabled: bool) -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let repo = ItemRepository::new(pool);
        let sync = if enabled {
            IndexSync::new(repo.clone(), Arc::new(InMemoryIndex::new()))
        } else {
            IndexSync::disabled(repo.clone())
        };
        TestContext {
            app: router(Catalog::new(repo, sync)),
            _temp_dir: temp_dir,
        }
    }

    async fn setup() -> TestContext {
        setup_with(true).await
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, value)
    }

    async fn create(app: &Router, name: &str, category: &str, stock: i64) -> i64 {
        let (status, _, body) = send(
            app,
            "POST",
            "/items",
            Some(json!({ "name": name, "category": category, "stock": stock })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health_and_ping() {
        let ctx = setup().await;

        let (status, _, body) = send(&ctx.app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _, body) = send(&ctx.app, "GET", "/items/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_star_scenario_over_http() {
        let ctx = setup().await;
        let app = &ctx.app;

        let id = create(app, "Star", "Bronze", 5).await;

        let (status, _, body) =
            send(app, "POST", &format!("/items/{}/decrement?qty=3", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock"], 2);

        let (status, _, body) =
            send(app, "POST", &format!("/items/{}/decrement?qty=3", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (_, _, body) = send(app, "GET", &format!("/items/{}", id), None).await;
        assert_eq!(body["stock"], 2);

        let (status, _, _) = send(app, "DELETE", &format!("/items/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, body) = send(app, "GET", &format!("/items/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_create_ignores_id_and_defaults_stock() {
        let ctx = setup().await;

        let (status, _, body) = send(
            &ctx.app,
            "POST",
            "/items",
            Some(json!({ "id": 500, "name": "Moon", "category": "Silver" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_ne!(body["id"], 500);
        assert_eq!(body["stock"], 0);
    }

    #[tokio::test]
    async fn test_create_identical_items_twice() {
        let ctx = setup().await;

        let first = create(&ctx.app, "Star", "Bronze", 1).await;
        let second = create(&ctx.app, "Star", "Bronze", 1).await;
        assert_ne!(first, second);

        let (_, _, body) = send(&ctx.app, "GET", "/items?category=Bronze", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_decrement_defaults_to_one() {
        let ctx = setup().await;
        let id = create(&ctx.app, "Star", "Bronze", 5).await;

        let (status, _, body) =
            send(&ctx.app, "POST", &format!("/items/{}/decrement", id), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stock"], 4);
    }

    #[tokio::test]
    async fn test_decrement_non_positive_qty_is_400() {
        let ctx = setup().await;
        let id = create(&ctx.app, "Star", "Bronze", 5).await;

        for qty in ["0", "-2"] {
            let uri = format!("/items/{}/decrement?qty={}", id, qty);
            let (status, _, body) = send(&ctx.app, "POST", &uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "invalid_request");
        }

        let (_, _, body) = send(&ctx.app, "GET", &format!("/items/{}", id), None).await;
        assert_eq!(body["stock"], 5);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_400() {
        let ctx = setup().await;

        for (method, uri) in [
            ("GET", "/items/abc"),
            ("DELETE", "/items/abc"),
            ("POST", "/items/abc/decrement"),
        ] {
            let (status, _, body) = send(&ctx.app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
            assert_eq!(body["error"], "invalid_request");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_non_numeric_qty_is_json_400() {
        let ctx = setup().await;
        let id = create(&ctx.app, "Star", "Bronze", 5).await;

        let uri = format!("/items/{}/decrement?qty=abc", id);
        let (status, _, body) = send(&ctx.app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (_, _, body) = send(&ctx.app, "GET", &format!("/items/{}", id), None).await;
        assert_eq!(body["stock"], 5);
    }

    #[tokio::test]
    async fn test_missing_name_is_json_400() {
        let ctx = setup().await;

        let (status, _, body) = send(
            &ctx.app,
            "POST",
            "/items",
            Some(json!({ "category": "Bronze" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().unwrap().contains("name"));

        let (_, _, body) = send(&ctx.app, "GET", "/items", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_update_body_is_json_400() {
        let ctx = setup().await;
        let id = create(&ctx.app, "Star", "Bronze", 5).await;

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/items/{}", id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = ctx.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "invalid_request");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_400() {
        let ctx = setup().await;

        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .body(Body::from(r#"{"name":"Star","category":"Bronze"}"#))
            .unwrap();
        let response = ctx.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "invalid_request");
    }

    #[tokio::test]
    async fn test_decrement_missing_item_is_409() {
        let ctx = setup().await;

        let (status, _, _) = send(&ctx.app, "POST", "/items/9999/decrement?qty=1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_and_missing_update() {
        let ctx = setup().await;
        let id = create(&ctx.app, "Star", "Bronze", 5).await;

        let (status, _, body) = send(
            &ctx.app,
            "PUT",
            &format!("/items/{}", id),
            Some(json!({ "name": "Star", "category": "Gold", "stock": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "Gold");
        assert_eq!(body["stock"], 9);

        let (status, _, _) = send(
            &ctx.app,
            "PUT",
            "/items/9999",
            Some(json!({ "name": "X", "category": "Y" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_is_404() {
        let ctx = setup().await;

        let (status, _, _) = send(&ctx.app, "DELETE", "/items/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let ctx = setup().await;
        create(&ctx.app, "Star", "Bronze", 1).await;
        create(&ctx.app, "Moon", "Gold", 1).await;

        let (_, _, body) = send(&ctx.app, "GET", "/items", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, _, body) = send(&ctx.app, "GET", "/items?name=Mo", None).await;
        assert_eq!(body[0]["name"], "Moon");

        let (_, _, body) = send(&ctx.app, "GET", "/items?category=Bronze", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Star");
    }

    #[tokio::test]
    async fn test_search_hits_index() {
        let ctx = setup().await;
        create(&ctx.app, "Star", "Bronze", 1).await;
        create(&ctx.app, "Moon", "Gold", 1).await;

        let (status, headers, body) =
            send(&ctx.app, "GET", "/items/search?name=star", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(SEARCH_INDEX_HEADER).is_none());
        assert_eq!(body.as_array().unwrap().len(), 1);
        // Index documents carry the id as a string
        assert!(body[0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_search_disabled_sets_header() {
        let ctx = setup_with(false).await;
        create(&ctx.app, "Star", "Bronze", 1).await;

        let (status, headers, body) = send(&ctx.app, "GET", "/items/search", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(SEARCH_INDEX_HEADER).unwrap(), "disabled");
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_reindex_get_and_post() {
        let ctx = setup().await;
        create(&ctx.app, "Star", "Bronze", 1).await;
        create(&ctx.app, "Moon", "Gold", 1).await;

        for method in ["POST", "GET"] {
            let (status, _, body) = send(&ctx.app, method, "/items/reindex", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["reindexed"], 2);
        }
    }

    #[tokio::test]
    async fn test_index_status() {
        let ctx = setup().await;
        create(&ctx.app, "Star", "Bronze", 1).await;

        let (status, _, body) = send(&ctx.app, "GET", "/items/index/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], true);
        assert_eq!(body["match_mode"], "any");
        assert_eq!(body["store_count"], 1);
        assert_eq!(body["index_count"], 1);
    }
}
