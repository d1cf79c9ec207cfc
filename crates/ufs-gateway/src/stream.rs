//! Pass-through stages of the download pipeline
//!
//! The backend stream and the output of the store's transform hook are each
//! wrapped in a [`ReadGuard`]. A guard forwards chunks untouched, reports the
//! first error to the store's read-error hook and ends the stream after it.
//! The outermost guard also reports a body dropped before completion, which is
//! how a client disconnect shows up. With a declared length, the body is
//! complete once that many bytes went out: the server stops polling there.

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use ufs_store::{FileRecord, Store};

/// Calls the read-error hook at most once per download
pub struct ReadErrorReporter {
    store: Arc<dyn Store>,
    file_id: String,
    record: FileRecord,
    reported: AtomicBool,
}

impl ReadErrorReporter {
    pub fn new(store: Arc<dyn Store>, file_id: String, record: FileRecord) -> Arc<Self> {
        Arc::new(Self {
            store,
            file_id,
            record,
            reported: AtomicBool::new(false),
        })
    }

    /// Forward an error to the hook unless one was already reported
    pub fn report(&self, error: &io::Error) {
        if !self.reported.swap(true, Ordering::SeqCst) {
            self.store.on_read_error(error, &self.file_id, &self.record);
        }
    }

    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::SeqCst)
    }
}

pin_project! {
    /// Error-observing pass-through stream
    pub struct ReadGuard<S> {
        #[pin]
        inner: S,
        reporter: Arc<ReadErrorReporter>,
        finished: bool,
        report_disconnect: bool,
        expected_len: Option<u64>,
        delivered: u64,
    }

    impl<S> PinnedDrop for ReadGuard<S> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if *this.report_disconnect && !*this.finished {
                tracing::warn!(file_id = %this.reporter.file_id, "Client went away mid-download");
                this.reporter.report(&io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "response dropped before completion",
                ));
            }
        }
    }
}

impl<S> ReadGuard<S> {
    /// Guard for the backend read stream
    pub fn source(inner: S, reporter: Arc<ReadErrorReporter>) -> Self {
        Self {
            inner,
            reporter,
            finished: false,
            report_disconnect: false,
            expected_len: None,
            delivered: 0,
        }
    }

    /// Guard for the stream handed to the response body
    pub fn passthrough(inner: S, reporter: Arc<ReadErrorReporter>) -> Self {
        Self {
            inner,
            reporter,
            finished: false,
            report_disconnect: true,
            expected_len: None,
            delivered: 0,
        }
    }

    /// Treat the stream as complete after `len` bytes
    pub fn with_expected_len(mut self, len: Option<u64>) -> Self {
        self.expected_len = len;
        self
    }
}

impl<S> Stream for ReadGuard<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                *this.finished = true;
                this.reporter.report(&e);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                *this.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(chunk))) => {
                *this.delivered += chunk.len() as u64;
                if let Some(len) = *this.expected_len {
                    if *this.delivered >= len {
                        *this.finished = true;
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
