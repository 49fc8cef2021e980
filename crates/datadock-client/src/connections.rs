//! Connection endpoints and post-test status polling.

use std::time::Duration;

use datadock_core::model::{Connection, ConnectionTestResult, ResourceId};
use datadock_core::{ConnectionPayload, Result};

use crate::client::{ApiClient, Listing};

/// Tracing target for connection operations.
pub const TRACING_TARGET: &str = "datadock_client::connections";

/// Backoff used while waiting for a test result to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Delay before the first refetch.
    pub initial_delay: Duration,
    /// Upper bound of a single delay.
    pub max_delay: Duration,
    /// Number of refetches before giving up.
    pub max_attempts: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            max_attempts: 6,
        }
    }
}

impl RefreshPolicy {
    /// Delay before the given 0-based attempt: doubles each time, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Result of [`ConnectionsApi::test_and_refresh`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    /// What the test endpoint answered.
    pub result: ConnectionTestResult,
    /// Freshest record fetched after the test.
    pub connection: Connection,
    /// Whether the record reflected the test before polling ran out.
    pub refreshed: bool,
}

/// Connection endpoints under `/api/v1/connections`.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ConnectionsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Lists saved connections.
    pub async fn list(&self) -> Result<Vec<Connection>> {
        let listing: Listing<Connection> = self.client.get(&["connections"]).await?;
        let connections = listing.into_vec();

        tracing::debug!(
            target: TRACING_TARGET,
            count = connections.len(),
            "Listed connections"
        );

        Ok(connections)
    }

    /// Fetches one connection.
    pub async fn get(&self, id: &ResourceId) -> Result<Connection> {
        self.client.get(&["connections", id.to_string().as_str()]).await
    }

    /// Saves a new connection.
    pub async fn create(&self, payload: &ConnectionPayload) -> Result<Connection> {
        let connection: Connection = self.client.post(&["connections"], payload).await?;

        tracing::info!(
            target: TRACING_TARGET,
            connection_id = %connection.id,
            name = payload.name(),
            family = %payload.family(),
            "Created connection"
        );

        Ok(connection)
    }

    /// Tests an unsaved configuration.
    ///
    /// A 2xx answer with `success: false` is a failed result, not an error.
    pub async fn test_config(&self, payload: &ConnectionPayload) -> Result<ConnectionTestResult> {
        let result: ConnectionTestResult =
            self.client.post(&["connections", "test"], payload).await?;

        let (host, port) = payload.endpoint();
        tracing::debug!(
            target: TRACING_TARGET,
            name = payload.name(),
            host,
            port,
            family = %payload.family(),
            passed = result.passed(),
            "Tested connection configuration"
        );

        Ok(result)
    }

    /// Tests a saved connection.
    pub async fn test(&self, id: &ResourceId) -> Result<ConnectionTestResult> {
        let result: ConnectionTestResult = self
            .client
            .post_empty(&["connections", id.to_string().as_str(), "test"])
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            connection_id = %id,
            passed = result.passed(),
            "Tested connection"
        );

        Ok(result)
    }

    /// Updates a saved connection. Build the payload in edit mode so blank
    /// secrets are left untouched.
    pub async fn update(&self, id: &ResourceId, payload: &ConnectionPayload) -> Result<Connection> {
        let connection: Connection = self
            .client
            .patch(&["connections", id.to_string().as_str()], payload)
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            connection_id = %id,
            "Updated connection"
        );

        Ok(connection)
    }

    /// Deletes a saved connection.
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.client.delete(&["connections", id.to_string().as_str()]).await?;

        tracing::info!(
            target: TRACING_TARGET,
            connection_id = %id,
            "Deleted connection"
        );

        Ok(())
    }

    /// Tests a saved connection, then polls it until the stored test
    /// status reflects the run.
    ///
    /// The record counts as refreshed once `last_tested_at` moves past its
    /// pre-test value or `last_test_status` changes. Retryable fetch
    /// failures while polling are logged and skipped.
    pub async fn test_and_refresh(
        &self,
        id: &ResourceId,
        policy: RefreshPolicy,
    ) -> Result<TestOutcome> {
        let before = self.get(id).await?;
        let result = self.test(id).await?;
        let mut latest = before.clone();

        for attempt in 0..policy.max_attempts {
            tokio::time::sleep(policy.delay(attempt)).await;

            let current = match self.get(id).await {
                Ok(current) => current,
                Err(error) if error.is_retryable() => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        connection_id = %id,
                        attempt,
                        error = %error,
                        "Refetch after test failed, retrying"
                    );
                    continue;
                }
                Err(error) => return Err(error),
            };

            if has_advanced(&before, &current) {
                tracing::debug!(
                    target: TRACING_TARGET,
                    connection_id = %id,
                    attempt,
                    status = %current.test_status(),
                    "Connection status refreshed"
                );
                return Ok(TestOutcome {
                    result,
                    connection: current,
                    refreshed: true,
                });
            }

            latest = current;
        }

        tracing::warn!(
            target: TRACING_TARGET,
            connection_id = %id,
            attempts = policy.max_attempts,
            "Connection status did not change after test"
        );

        Ok(TestOutcome {
            result,
            connection: latest,
            refreshed: false,
        })
    }
}

fn has_advanced(before: &Connection, current: &Connection) -> bool {
    current.last_tested_at > before.last_tested_at
        || current.last_test_status != before.last_test_status
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use datadock_core::model::ConnectionTestStatus;
    use datadock_core::{ConnectionWizard, ErrorKind, FormField};
    use serde_json::{Value, json};

    use super::*;
    use crate::ApiConfig;
    use crate::testing;

    fn client(base: String) -> ApiClient {
        ApiClient::new(ApiConfig::new(base)).unwrap()
    }

    fn fast_policy() -> RefreshPolicy {
        RefreshPolicy {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            max_attempts: 4,
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_the_cap() {
        let policy = RefreshPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(250));
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(3), Duration::from_secs(2));
        assert_eq!(policy.delay(4), Duration::from_secs(4));
        assert_eq!(policy.delay(40), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_list_accepts_wrapped_response() {
        let router = Router::new().route(
            "/api/v1/connections",
            get(|| async {
                axum::Json(json!({"connections": [
                    {"id": 1, "name": "orders", "connection_type": "postgresql"},
                    {"id": "c-2", "name": "raw", "type": "s3", "last_test_status": "passed"}
                ]}))
            }),
        );
        let client = client(testing::serve(router).await);

        let connections = client.connections().list().await.unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[1].connection_type, "s3");
        assert_eq!(connections[1].test_status(), ConnectionTestStatus::Success);
    }

    #[tokio::test]
    async fn test_create_posts_flat_payload() {
        let router = Router::new().route(
            "/api/v1/connections",
            post(|axum::Json(body): axum::Json<Value>| async move {
                let mut saved = body.clone();
                saved["id"] = json!(7);
                if let Some(object) = saved.as_object_mut() {
                    object.remove("password");
                }
                (StatusCode::CREATED, axum::Json(saved))
            }),
        );
        let client = client(testing::serve(router).await);

        let mut wizard = ConnectionWizard::new();
        wizard.select_by_id("s3").unwrap();
        wizard.set(FormField::Name, "raw").unwrap();
        wizard.set(FormField::Database, "raw-events").unwrap();
        wizard.set(FormField::Username, "AKIA").unwrap();
        wizard.set(FormField::Password, "secret").unwrap();
        let payload = wizard.build_payload().unwrap();

        let saved = client.connections().create(&payload).await.unwrap();
        assert_eq!(saved.id, ResourceId::Int(7));
        assert_eq!(saved.host, "s3.amazonaws.com");
        assert_eq!(saved.port, Some(443));
        assert_eq!(saved.extra_str("region"), Some("us-east-1"));
    }

    #[tokio::test]
    async fn test_failed_test_body_is_not_an_error() {
        let router = Router::new().route(
            "/api/v1/connections/{id}/test",
            post(|| async {
                axum::Json(json!({"success": false, "message": "password authentication failed"}))
            }),
        );
        let client = client(testing::serve(router).await);

        let result = client
            .connections()
            .test(&ResourceId::Int(3))
            .await
            .unwrap();
        assert!(!result.passed());
        assert_eq!(result.display_message(), "password authentication failed");
    }

    #[tokio::test]
    async fn test_config_error_is_normalized() {
        let router = Router::new().route(
            "/api/v1/connections/test",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    axum::Json(json!({"detail": [
                        {"loc": ["body", "port"], "msg": "value is not a valid integer"}
                    ]})),
                )
            }),
        );
        let client = client(testing::serve(router).await);

        let mut wizard = ConnectionWizard::new();
        wizard.select_by_id("postgresql").unwrap();
        for (field, value) in [
            (FormField::Name, "orders"),
            (FormField::Host, "db"),
            (FormField::Database, "orders"),
            (FormField::Username, "etl"),
            (FormField::Password, "pw"),
        ] {
            wizard.set(field, value).unwrap();
        }
        let payload = wizard.build_payload().unwrap();

        wizard.begin_test();
        let outcome = client.connections().test_config(&payload).await;
        wizard.finish_test(outcome.map_err(|e| e.display_message()));
        assert_eq!(
            wizard.status(),
            &datadock_core::TestStatus::Error("port: value is not a valid integer".to_owned())
        );
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let router = Router::new().route(
            "/api/v1/connections/{id}",
            axum::routing::delete(|Path(id): Path<String>| async move {
                if id == "9" {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        );
        let client = client(testing::serve(router).await);

        client
            .connections()
            .delete(&ResourceId::Int(9))
            .await
            .unwrap();
        let err = client
            .connections()
            .delete(&ResourceId::Int(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    /// Backend that records the test result only after a few reads.
    fn lagging_backend(reads_before_update: usize, reads: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/api/v1/connections/{id}",
                get(move |State(reads): State<Arc<AtomicUsize>>| async move {
                    let n = reads.fetch_add(1, Ordering::SeqCst);
                    // The first read happens before the test runs.
                    let tested = n > reads_before_update;
                    axum::Json(if tested {
                        json!({
                            "id": 5, "name": "orders", "connection_type": "postgresql",
                            "last_test_status": "success",
                            "last_tested_at": "2026-03-01T10:00:05Z"
                        })
                    } else {
                        json!({
                            "id": 5, "name": "orders", "connection_type": "postgresql",
                            "last_test_status": "untested"
                        })
                    })
                }),
            )
            .route(
                "/api/v1/connections/{id}/test",
                post(|| async { axum::Json(json!({"success": true})) }),
            )
            .with_state(reads)
    }

    #[tokio::test]
    async fn test_and_refresh_stops_once_status_advances() {
        let reads = Arc::new(AtomicUsize::new(0));
        let client = client(testing::serve(lagging_backend(2, reads.clone())).await);

        let outcome = client
            .connections()
            .test_and_refresh(&ResourceId::Int(5), fast_policy())
            .await
            .unwrap();

        assert!(outcome.refreshed);
        assert!(outcome.result.passed());
        assert_eq!(
            outcome.connection.test_status(),
            ConnectionTestStatus::Success
        );
        assert!(outcome.connection.last_tested_at.is_some());
        // One read before the test, then polls until the third one sees it.
        assert_eq!(reads.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_and_refresh_gives_up_after_max_attempts() {
        let reads = Arc::new(AtomicUsize::new(0));
        let backend = lagging_backend(usize::MAX - 1, reads.clone());
        let client = client(testing::serve(backend).await);

        let outcome = client
            .connections()
            .test_and_refresh(&ResourceId::Int(5), fast_policy())
            .await
            .unwrap();

        assert!(!outcome.refreshed);
        assert_eq!(
            outcome.connection.test_status(),
            ConnectionTestStatus::Untested
        );
        assert_eq!(reads.load(Ordering::SeqCst), 1 + 4);
    }
}
