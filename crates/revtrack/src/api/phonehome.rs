//! Resolution endpoint
//!
//! Records the reporting client, then answers with the revision the first
//! matching rule assigns to its hostname.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use revtrack_api::{PhonehomeRequest, PhonehomeResponse};
use revtrack_core::RuleSet;
use revtrack_store::PhonehomeRecord;
use tracing::{debug, instrument};

use crate::api::error::{AppError, NO_CACHE};
use crate::state::AppState;

/// Read a report regardless of content type
///
/// A body that is not a JSON report counts as an empty one, so it is
/// rejected with the missing-field reason.
fn parse_report(body: &[u8]) -> PhonehomeRequest {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "unreadable phonehome body");
        PhonehomeRequest::default()
    })
}

/// Record a client report and resolve its target revision
#[utoipa::path(
    post,
    path = "/phonehome",
    tag = "phonehome",
    request_body = PhonehomeRequest,
    responses(
        (status = 200, description = "Resolved revision, absent when no rule matched", body = PhonehomeResponse),
        (status = 400, description = "Missing package_name or hostname", body = String, content_type = "text/plain"),
        (status = 500, description = "Storage failure")
    )
)]
#[instrument(skip_all)]
pub async fn phonehome(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let report = parse_report(&body);
    report.validate()?;

    if let Some(git_hash) = &report.git_hash {
        let record = PhonehomeRecord::new(
            &report.package_name,
            state.record_hostname(&report.hostname),
            git_hash,
            report.ip_list.joined(),
        );
        state.store.upsert_report(&record).await?;
    }

    let rules = state.store.rules_for_package(&report.package_name).await?;
    let target = RuleSet::new(rules)
        .resolve(&report.hostname)
        .map(|rule| rule.target_revision.clone());

    debug!(
        package = %report.package_name,
        hostname = %report.hostname,
        reported = ?report.git_hash,
        target = ?target,
        "resolved phonehome"
    );

    Ok((
        [(header::CACHE_CONTROL, NO_CACHE)],
        Json(PhonehomeResponse::resolved(target)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use revtrack_core::RevisionRule;
    use revtrack_store::{RevisionStore, StoreError};
    use serde_json::{Value, json};

    use super::*;
    use crate::config::Config;

    #[derive(Default)]
    struct MockStore {
        records: Mutex<Vec<PhonehomeRecord>>,
        rules: Vec<RevisionRule>,
        fail_upsert: bool,
        fail_rules: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RevisionStore for MockStore {
        async fn upsert_report(&self, record: &PhonehomeRecord) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_upsert {
                return Err(StoreError::Task("disk on fire".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn rules_for_package(
            &self,
            package_name: &str,
        ) -> Result<Vec<RevisionRule>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_rules {
                return Err(StoreError::Task("disk on fire".to_string()));
            }
            Ok(self
                .rules
                .iter()
                .filter(|r| r.package_name == package_name)
                .cloned()
                .collect())
        }
    }

    fn app_state(store: Arc<MockStore>, config: Config) -> Arc<AppState> {
        Arc::new(AppState::new(store, config))
    }

    async fn call_raw(state: Arc<AppState>, body: impl Into<Bytes>) -> (StatusCode, Response) {
        let response = phonehome(State(state), body.into()).await.into_response();
        (response.status(), response)
    }

    async fn call(state: Arc<AppState>, body: Value) -> (StatusCode, Response) {
        call_raw(state, body.to_string()).await
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_package_name() {
        let store = Arc::new(MockStore::default());
        let state = app_state(store.clone(), Config::default());

        let (status, response) = call(state, json!({"hostname": "web1"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "package_name is required");
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_hostname() {
        let store = Arc::new(MockStore::default());
        let state = app_state(store.clone(), Config::default());

        let (status, response) =
            call(state, json!({"package_name": "web", "hostname": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "hostname is required");
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_string_package_name_rejected() {
        let store = Arc::new(MockStore::default());
        let state = app_state(store.clone(), Config::default());

        let (status, response) =
            call(state, json!({"package_name": 5, "hostname": "web1"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "package_name is required");
    }

    #[tokio::test]
    async fn test_unreadable_body_gets_missing_field_reason() {
        let store = Arc::new(MockStore::default());
        let state = app_state(store.clone(), Config::default());

        for body in ["package_name=web&hostname=web1", "", "[1, 2]"] {
            let (status, response) = call_raw(state.clone(), body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                response.headers().get(header::CACHE_CONTROL).unwrap(),
                NO_CACHE
            );
            assert_eq!(body_text(response).await, "package_name is required");
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolves_first_rule_in_priority_order() {
        let store = Arc::new(MockStore {
            rules: vec![
                RevisionRule::new("web", "^ab", "ab-rev", 1),
                RevisionRule::new("web", "^a", "a-rev", 1),
                RevisionRule::new("web", "^db", "db-rev", 2),
                RevisionRule::new("api", ".", "api-rev", 9),
            ],
            ..MockStore::default()
        });
        let state = app_state(store, Config::default());

        let (status, response) =
            call(state.clone(), json!({"package_name": "web", "hostname": "abc"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            NO_CACHE
        );
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, json!({"git_hash": "a-rev"}));

        let (_, response) = call(state, json!({"package_name": "web", "hostname": "db1"})).await;
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, json!({"git_hash": "db-rev"}));
    }

    #[tokio::test]
    async fn test_no_match_omits_revision() {
        let store = Arc::new(MockStore {
            rules: vec![RevisionRule::new("web", "^db", "db-rev", 1)],
            ..MockStore::default()
        });
        let state = app_state(store, Config::default());

        let (status, response) =
            call(state, json!({"package_name": "web", "hostname": "web1"})).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_report_without_revision_not_recorded() {
        let store = Arc::new(MockStore::default());
        let state = app_state(store.clone(), Config::default());

        let (status, _) = call(state, json!({"package_name": "web", "hostname": "web1"})).await;

        assert_eq!(status, StatusCode::OK);
        assert!(store.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_short_hostname_but_matches_full() {
        let store = Arc::new(MockStore {
            rules: vec![RevisionRule::new("web", r"\.eu\.", "eu-rev", 1)],
            ..MockStore::default()
        });
        let state = app_state(store.clone(), Config::default());

        let (_, response) = call(
            state,
            json!({
                "package_name": "web",
                "hostname": "web1.eu.example.com",
                "git_hash": "aaa",
                "ip_list": ["10.0.0.1", "10.0.0.2"]
            }),
        )
        .await;

        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, json!({"git_hash": "eu-rev"}));

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hostname, "web1");
        assert_eq!(records[0].git_hash, "aaa");
        assert_eq!(records[0].ip_list, "10.0.0.1,10.0.0.2");
    }

    #[tokio::test]
    async fn test_full_hostname_key_and_joined_ip_list() {
        let store = Arc::new(MockStore::default());
        let mut config = Config::default();
        config.store.short_hostname_key = false;
        let state = app_state(store.clone(), config);

        call(
            state,
            json!({
                "package_name": "web",
                "hostname": "web1.example.com",
                "git_hash": "aaa",
                "ip_list": "10.0.0.1,10.0.0.2"
            }),
        )
        .await;

        let records = store.records.lock().unwrap();
        assert_eq!(records[0].hostname, "web1.example.com");
        assert_eq!(records[0].ip_list, "10.0.0.1,10.0.0.2");
    }

    #[tokio::test]
    async fn test_upsert_failure_is_empty_500() {
        let store = Arc::new(MockStore {
            fail_upsert: true,
            rules: vec![RevisionRule::new("web", ".", "rev", 1)],
            ..MockStore::default()
        });
        let state = app_state(store, Config::default());

        let (status, response) = call(
            state,
            json!({"package_name": "web", "hostname": "web1", "git_hash": "aaa"}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            NO_CACHE
        );
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_rule_lookup_failure_is_empty_500() {
        let store = Arc::new(MockStore {
            fail_rules: true,
            ..MockStore::default()
        });
        let state = app_state(store, Config::default());

        let (status, response) =
            call(state, json!({"package_name": "web", "hostname": "web1"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "");
    }
}
