//! HTTP Serving and Shutdown
//!
//! Wraps the records router with a per-request deadline and runs it until a shutdown signal,
//! giving in-flight requests a bounded window to finish.

use crate::records::handlers::{SharedStore, router};
use crate::records::types::ErrorResponse;

use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// The records router with every request bounded by `request_timeout`.
pub fn app(store: SharedStore, request_timeout: Duration) -> Router {
    router(store).layer(middleware::from_fn_with_state(
        request_timeout,
        enforce_request_timeout,
    ))
}

async fn enforce_request_timeout(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("Request to {} timed out after {:?}", path, limit);
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(ErrorResponse {
                    error: format!("request timed out after {limit:?}"),
                }),
            )
                .into_response()
        }
    }
}

/// Serves `app` on `listener` until `shutdown` resolves, then drains for at most
/// `drain_timeout`.
///
/// Returns once the accept loop has stopped. If draining overruns, the accept loop is aborted
/// and awaited; connections that were already open at that point keep their own clone of
/// `app` (and of the store inside it) until the peer disconnects or the process exits.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let drain = Arc::new(Notify::new());
    let mut server = {
        let drain = drain.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { drain.notified().await })
                .await
        })
    };

    tokio::select! {
        result = &mut server => {
            return result.context("server task panicked")?.context("server failed");
        }
        _ = shutdown => {
            tracing::info!("Shutting down server...");
        }
    }

    drain.notify_one();
    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!("Server error during shutdown: {}", e),
        Ok(Err(e)) => tracing::error!("Server task failed during shutdown: {}", e),
        Err(_) => {
            tracing::warn!("Server forced to shutdown after {:?}", drain_timeout);
            server.abort();
            if let Err(e) = server.await
                && !e.is_cancelled()
            {
                tracing::error!("Server task failed while aborting: {}", e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::types::Record;
    use crate::storage::error::StoreError;
    use crate::storage::memory::MemoryStore;
    use crate::storage::store::{Backend, RecordStore};

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    /// A store whose reads never finish in time.
    struct StalledStore;

    #[async_trait::async_trait]
    impl RecordStore for StalledStore {
        async fn list(&self) -> Result<Vec<Record>, StoreError> {
            Ok(Vec::new())
        }

        async fn get(&self, _name: &str) -> Result<Option<Record>, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }

        async fn put(&self, _record: Record) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _name: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn backend(&self) -> Backend {
            Backend::Memory
        }
    }

    #[tokio::test]
    async fn test_slow_request_gets_request_timeout() {
        let app = app(Arc::new(StalledStore), Duration::from_millis(50));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/records/web.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_fast_request_is_unaffected_by_timeout() {
        let app = app(Arc::new(MemoryStore::new()), Duration::from_secs(5));

        let response = app
            .oneshot(HttpRequest::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serve_releases_store_after_shutdown() {
        // ARRANGE
        let store: SharedStore = Arc::new(MemoryStore::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let running = tokio::spawn(serve(
            listener,
            app(store.clone(), Duration::from_secs(5)),
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_secs(5),
        ));

        // ACT: one request over a real connection, then shut down
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 200"), "got {reply}");

        stop_tx.send(()).unwrap();
        running.await.unwrap().unwrap();

        // ASSERT: nothing but this test still holds the store
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
