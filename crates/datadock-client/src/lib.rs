#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub mod connections;
pub mod pipelines;
pub mod schedules;

pub use crate::client::{ApiClient, TRACING_TARGET};
pub use crate::config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use crate::connections::{ConnectionsApi, RefreshPolicy, TestOutcome};
pub use crate::pipelines::{DEFAULT_WATCH_INTERVAL, PipelinesApi};
pub use crate::schedules::{SchedulerAvailability, SchedulesApi};

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
