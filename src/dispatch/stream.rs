//! Delivery of responses to the caller.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::types::ApiResponse;
use crate::{Error, ErrorKind, Result};

type Delivery = Result<ApiResponse>;

/// The responses to one API call.
///
/// Yields one item, or two when a cached response was found: the cached
/// response (`from_cache == true`) always comes first, followed by the live
/// result. The live result is always the last item, success or failure.
///
/// Dropping the stream discards the results. The request itself still
/// completes.
///
/// ## Example
///
/// ```rust,no_run
/// use eta::{ApiRequest, Client};
/// use futures::StreamExt;
///
/// # async fn example(client: Client) -> eta::Result<()> {
/// let request = ApiRequest::builder().path("/v2/catalogs").use_cache(true).build();
/// let mut responses = client.request(request);
///
/// while let Some(response) = responses.next().await {
///     let response = response?;
///     println!("from cache: {}, payload: {}", response.from_cache, response.payload);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResponseStream {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl ResponseStream {
    /// Waits for the next response.
    pub async fn next_response(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Waits for the live result, skipping any cached delivery.
    pub async fn live(mut self) -> Result<ApiResponse> {
        let mut last = None;
        while let Some(delivery) = self.rx.recv().await {
            last = Some(delivery);
        }
        last.unwrap_or_else(|| {
            Err(Error::new(
                ErrorKind::Unknown,
                "Request ended without a response",
            ))
        })
    }

    /// Waits for every delivery, in order.
    pub async fn collect_all(mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(2);
        while let Some(delivery) = self.rx.recv().await {
            deliveries.push(delivery);
        }
        deliveries
    }
}

impl Stream for ResponseStream {
    type Item = Delivery;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Sending half of a [`ResponseStream`].
///
/// `finish` consumes the completion, so the final delivery happens exactly
/// once. Dropping it without finishing ends the stream early.
#[derive(Debug)]
pub(crate) struct Completion {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Completion {
    pub fn channel() -> (Completion, ResponseStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Completion { tx }, ResponseStream { rx })
    }

    /// Delivers a cached payload ahead of the live result.
    pub fn deliver_cached(&self, payload: Value) {
        let _ = self.tx.send(Ok(ApiResponse::cached(payload)));
    }

    /// Delivers the final result.
    pub fn finish(self, result: Delivery) {
        let _ = self.tx.send(result);
    }
}
