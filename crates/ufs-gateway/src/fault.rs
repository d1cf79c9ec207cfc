//! Per-request fault boundary for downloads
//!
//! Each download gets its own boundary: the pipeline runs in a spawned task
//! tied to a fresh cancellation token, and the response body is wrapped so a
//! panic while streaming ends that one response. Nothing escapes to the
//! connection task or the process.

use crate::GatewayError;
use axum::response::Response;
use futures::{FutureExt, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use ufs_store::ByteStream;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Isolation scope for one download
#[derive(Clone)]
pub struct FaultBoundary {
    scope: Arc<str>,
    token: CancellationToken,
}

impl FaultBoundary {
    /// Create a boundary; `scope` only labels log lines
    pub fn new(scope: impl Into<Arc<str>>) -> Self {
        Self {
            scope: scope.into(),
            token: CancellationToken::new(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[cfg(test)]
    fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `pipeline` in its own task. A panic becomes a logged 500; dropping
    /// the returned future cancels the task.
    pub async fn run<F>(&self, pipeline: F) -> Result<Response, GatewayError>
    where
        F: Future<Output = Result<Response, GatewayError>> + Send + 'static,
    {
        let token = self.token.clone();
        let _cancel_on_drop = self.token.clone().drop_guard();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => None,
                result = pipeline => Some(result),
            }
        });

        match task.await {
            Ok(Some(result)) => result,
            Ok(None) => Err(GatewayError::Fault(format!("{}: cancelled", self.scope))),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                error!(scope = %self.scope, panic = %message, "Download pipeline panicked");
                Err(GatewayError::Fault(format!("{}: {}", self.scope, message)))
            }
            Err(e) => {
                error!(scope = %self.scope, error = %e, "Download task failed");
                Err(GatewayError::Fault(format!("{}: {}", self.scope, e)))
            }
        }
    }

    /// Turn a panic raised while polling `stream` into a terminal I/O error
    pub fn guard_stream(&self, stream: ByteStream) -> ByteStream {
        let scope = Arc::clone(&self.scope);
        Box::pin(AssertUnwindSafe(stream).catch_unwind().map(move |item| {
            item.unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(scope = %scope, panic = %message, "Download stream panicked");
                Err(std::io::Error::other(format!("stream panicked: {}", message)))
            })
        }))
    }
}
