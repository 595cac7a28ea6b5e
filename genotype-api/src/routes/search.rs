use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    domain::search::{OperationStatus, Schema, SearchOutcome, SearchRequest},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/about", get(about))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    marker: Option<String>,
    population: Option<String>,
    #[serde(default)]
    full_record: bool,
}

/// Always answers 200; the outcome is carried in `status`.
#[instrument(name = "GET /search", skip(app_state))]
async fn search(
    State(app_state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Json<SearchOutcome> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::warn!("could not read search parameters: {}", rejection.body_text());
            return Json(SearchOutcome::empty(OperationStatus::FailedToStart));
        }
    };

    let request = SearchRequest::new(query.marker, query.population, query.full_record);
    let service = app_state.search_service();
    let ctx = service
        .new_context()
        .with_cancellation(app_state.shutdown_token().child_token());

    Json(service.search(&request, &ctx).await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDescription {
    name: &'static str,
    description: &'static str,
    parameters: [ParameterDescription; 3],
    record_fields: [&'static str; 3],
    marker_fields: [&'static str; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterDescription {
    name: &'static str,
    query_key: &'static str,
    kind: &'static str,
    description: &'static str,
}

#[instrument(name = "GET /search/about")]
async fn about() -> Json<ServiceDescription> {
    let schema = Schema::DEFAULT;

    Json(ServiceDescription {
        name: "ParentalGenotype search service",
        description: "Search parental genotype markers by marker name or population",
        parameters: [
            ParameterDescription {
                name: "Marker",
                query_key: "marker",
                kind: "keyword",
                description: "The name of the marker to search for",
            },
            ParameterDescription {
                name: "Population",
                query_key: "population",
                kind: "keyword",
                description: "The name of the population to search for",
            },
            ParameterDescription {
                name: "Return entire populations",
                query_key: "fullRecord",
                kind: "boolean",
                description: "Return the full matching populations for marker search results",
            },
        ],
        record_fields: schema.identity_fields(),
        marker_fields: [schema.chromosome, schema.mapping_position],
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::domain::search::store::MemoryDocumentStore;
    use crate::domain::search::SearchService;
    use crate::{router, AppState};

    const ID1: &str = "5bf2b0a3e4b0c8f1a2d3e401";
    const ID2: &str = "5bf2b0a3e4b0c8f1a2d3e402";

    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::new()
            .with_document("varieties", json!({ "name": "ParW001", "variety_ids": [ID1, ID2] }))
            .with_document(
                "populations",
                json!({
                    "_id": { "$oid": ID1 },
                    "population_name": "ParW001",
                    "parent_a": "Paragon",
                    "parent_b": "Watkins1190001",
                    "Contig.1234": { "chromosome": "1A", "mapping_position": "10.2" }
                }),
            )
            .with_document(
                "populations",
                json!({
                    "_id": { "$oid": ID2 },
                    "population_name": "ParW001",
                    "parent_a": "Paragon",
                    "parent_b": "Watkins1190001",
                    "M2": { "chromosome": "2B", "mapping_position": "3.0" }
                }),
            )
    }

    async fn get_json(store: MemoryDocumentStore, uri: &str) -> Value {
        let state = AppState::new(
            Arc::new(SearchService::with_defaults(store)),
            CancellationToken::new(),
        );
        let response = router::create(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn marker_search_returns_inline_results() {
        let body = get_json(store(), "/search?marker=Contig.1234").await;

        assert_eq!(body["status"], "succeeded");
        assert_eq!(body["results"][0]["protocol"], "inline");
        assert_eq!(body["results"][0]["title"], "ParW001");
        assert_eq!(
            body["results"][0]["data"]["Contig.1234"]["chromosome"],
            "1A"
        );
        assert!(body["results"][0]["data"].get("_id").is_none());
    }

    #[tokio::test]
    async fn population_search_merges_records() {
        let body = get_json(store(), "/search?population=ParW001&fullRecord=false").await;

        assert_eq!(body["status"], "succeeded");
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0]["data"].get("Contig.1234").is_some());
        assert!(results[0]["data"].get("M2").is_some());
    }

    #[tokio::test]
    async fn unreadable_parameters_fail_to_start() {
        let store = store();
        let body = get_json(store.clone(), "/search?marker=M2&fullRecord=maybe").await;

        assert_eq!(body, json!({ "status": "failed_to_start", "results": [] }));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_parameters_succeed_with_no_results() {
        let body = get_json(store(), "/search?marker=&population=").await;
        assert_eq!(body, json!({ "status": "succeeded", "results": [] }));
    }

    #[tokio::test]
    async fn unknown_marker_fails() {
        let body = get_json(store(), "/search?marker=M404").await;
        assert_eq!(body, json!({ "status": "failed", "results": [] }));
    }

    #[tokio::test]
    async fn about_describes_parameters() {
        let body = get_json(store(), "/search/about").await;

        assert_eq!(body["name"], "ParentalGenotype search service");
        let names: Vec<&str> = body["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Marker", "Population", "Return entire populations"]);
        assert_eq!(body["markerFields"], json!(["chromosome", "mapping_position"]));
    }
}
