//! Elasticsearch backend.
//!
//! Talks to a single index over the REST API:
//! - `PUT /{index}/_doc/{id}`: upsert one document
//! - `DELETE /{index}/_doc/{id}`: delete one document (404 is fine)
//! - `POST /{index}/_delete_by_query`: clear the index
//! - `POST /_bulk`: write many documents in one request
//! - `GET /{index}/_count`: document count
//! - `POST /{index}/_search`: wildcard/term queries
//!
//! Queries target the `.keyword` sub-fields, which exist both under the
//! mapping created by [`ElasticIndex::ensure_index`] and under Elasticsearch's
//! dynamic mapping for string fields.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::{IndexError, SearchIndex};
use crate::models::IndexedItem;

pub struct ElasticIndex {
    client: reqwest::Client,
    base_url: String,
    index: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: IndexedItem,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl ElasticIndex {
    /// Creates a client for `index` on the cluster at `base_url`.
    ///
    /// Every request is bounded by `timeout`; searches return at most
    /// `max_results` hits.
    pub fn new(
        base_url: &str,
        index: impl Into<String>,
        timeout: Duration,
        max_results: usize,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.into(),
            max_results,
        })
    }

    fn index_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url,
            urlencoding::encode(&self.index),
            suffix
        )
    }

    fn doc_url(&self, id: &str) -> String {
        self.index_url(&format!("/_doc/{}", urlencoding::encode(id)))
    }

    /// Creates the index with explicit mappings if it does not exist yet.
    pub async fn ensure_index(&self) -> Result<(), IndexError> {
        let response = self.client.head(self.index_url("")).send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        let response = self
            .client
            .put(self.index_url(""))
            .json(&index_mapping())
            .send()
            .await?;

        // Someone else may have created it between the two requests
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(IndexError::Status {
                status: StatusCode::BAD_REQUEST.as_u16(),
                body,
            });
        }

        check(response).await?;
        tracing::info!("Created search index '{}'", self.index);
        Ok(())
    }

    async fn query(&self, query: Value) -> Result<Vec<IndexedItem>, IndexError> {
        let body = json!({ "size": self.max_results, "query": query });

        let response = self
            .client
            .post(self.index_url("/_search"))
            .json(&body)
            .send()
            .await?;

        // Index not created yet: nothing has been indexed
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let parsed: SearchResponse = check(response).await?.json().await?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }

    fn bulk_body(&self, docs: &[IndexedItem]) -> Result<String, IndexError> {
        let mut body = String::new();
        for doc in docs {
            let action = json!({ "index": { "_index": self.index, "_id": doc.id } });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(doc)?);
            body.push('\n');
        }
        Ok(body)
    }
}

/// Passes successful responses through, turns anything else into an error.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IndexError::Status {
        status: status.as_u16(),
        body,
    })
}

fn index_mapping() -> Value {
    let text_with_keyword = json!({
        "type": "text",
        "fields": { "keyword": { "type": "keyword" } }
    });
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": text_with_keyword,
                "category": text_with_keyword,
                "stock": { "type": "integer" }
            }
        }
    })
}

/// Escapes wildcard metacharacters and wraps the fragment for substring matching.
fn wildcard_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('*');
    for c in fragment.chars() {
        if matches!(c, '*' | '?' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

/// Builds `{ "<field>.keyword": clause }`.
fn on_keyword(field: &str, clause: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(format!("{}.keyword", field), clause);
    map
}

fn contains_query(field: &str, fragment: &str) -> Value {
    let clause = json!({ "value": wildcard_pattern(fragment), "case_insensitive": true });
    json!({ "wildcard": on_keyword(field, clause) })
}

fn term_query(field: &str, value: &str) -> Value {
    json!({ "term": on_keyword(field, json!(value)) })
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    fn backend(&self) -> &'static str {
        "elasticsearch"
    }

    async fn upsert(&self, doc: &IndexedItem) -> Result<(), IndexError> {
        let response = self
            .client
            .put(self.doc_url(&doc.id))
            .query(&[("refresh", "wait_for")])
            .json(doc)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), IndexError> {
        let response = self
            .client
            .delete(self.doc_url(id))
            .query(&[("refresh", "wait_for")])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.index_url("/_delete_by_query"))
            .query(&[("refresh", "true"), ("conflicts", "proceed")])
            .json(&json!({ "query": { "match_all": {} } }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn bulk_upsert(&self, docs: &[IndexedItem]) -> Result<(), IndexError> {
        if docs.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .query(&[("refresh", "wait_for")])
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(self.bulk_body(docs)?)
            .send()
            .await?;

        let parsed: BulkResponse = check(response).await?.json().await?;
        if parsed.errors {
            let rejected = parsed
                .items
                .iter()
                .filter(|item| item.get("index").and_then(|i| i.get("error")).is_some())
                .count();
            return Err(IndexError::BulkRejected(rejected));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, IndexError> {
        let response = self.client.get(self.index_url("/_count")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let parsed: CountResponse = check(response).await?.json().await?;
        Ok(parsed.count)
    }

    async fn find_by_name_contains(&self, name: &str) -> Result<Vec<IndexedItem>, IndexError> {
        self.query(contains_query("name", name)).await
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<IndexedItem>, IndexError> {
        self.query(term_query("category", category)).await
    }

    async fn find_by_name_or_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError> {
        self.query(json!({
            "bool": {
                "should": [contains_query("name", name), contains_query("category", category)],
                "minimum_should_match": 1
            }
        }))
        .await
    }

    async fn find_by_name_and_category_contains(
        &self,
        name: &str,
        category: &str,
    ) -> Result<Vec<IndexedItem>, IndexError> {
        self.query(json!({
            "bool": {
                "must": [contains_query("name", name), contains_query("category", category)]
            }
        }))
        .await
    }

    async fn list_all(&self) -> Result<Vec<IndexedItem>, IndexError> {
        self.query(json!({ "match_all": {} })).await
    }
}
