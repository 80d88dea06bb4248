use std::time::Instant;

use tracing::info;
use tripwise_core::error::{PipelineError, Result};
use tripwise_core::pipeline::SessionResource;

/// A live connection to the travel tool server, held for one run.
///
/// Acquired with a health probe; released when the run ends or the
/// connection is dropped.
pub struct ToolConnection {
    url: String,
    opened_at: Instant,
}

impl ToolConnection {
    /// Probe `{url}/health` and open the connection.
    pub async fn acquire(client: &reqwest::Client, url: &str) -> Result<Self> {
        let base = url.trim_end_matches('/');
        let response = client
            .get(format!("{base}/health"))
            .send()
            .await
            .map_err(|e| PipelineError::ToolConnection(format!("{base}: {e}")))?;
        if !response.status().is_success() {
            return Err(PipelineError::ToolConnection(format!(
                "{base}: health check returned {}",
                response.status()
            ))
            .into());
        }
        info!(url = base, "tool connection opened");
        Ok(Self {
            url: base.to_string(),
            opened_at: Instant::now(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ToolConnection {
    fn drop(&mut self) {
        info!(
            url = %self.url,
            held_ms = self.opened_at.elapsed().as_millis() as u64,
            "tool connection released"
        );
    }
}

impl SessionResource for ToolConnection {
    fn release(self: Box<Self>) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn acquires_when_healthy() {
        let url = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        let conn = ToolConnection::acquire(&reqwest::Client::new(), &format!("{url}/"))
            .await
            .unwrap();
        assert_eq!(conn.url(), url);
    }

    #[tokio::test]
    async fn unhealthy_server_is_rejected() {
        let url = serve(Router::new().route(
            "/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        let err = ToolConnection::acquire(&reqwest::Client::new(), &url)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("health check returned 503"));
    }

    #[tokio::test]
    async fn unreachable_server_is_rejected() {
        let err = ToolConnection::acquire(&reqwest::Client::new(), "http://127.0.0.1:1")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("Pipeline error: tool server unavailable"));
    }
}
