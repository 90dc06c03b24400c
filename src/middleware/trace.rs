//! Request logging.

use std::time::{Duration, Instant};

use http::StatusCode;
use tracing::{Instrument, info, info_span, warn};

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// Wraps every request in an `info` span carrying its method and path and
/// logs the status and latency when the inner pipeline finishes.
///
/// The latency is recorded by a drop guard, so it is logged even when the
/// inner future panics or is dropped before producing a response.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        Box::pin(
            async move {
                let mut timer = Timer::start();
                let res = next.run(req).await;
                timer.status = Some(res.status_code());
                res
            }
            .instrument(span),
        )
    }
}

struct Timer {
    started: Instant,
    status: Option<StatusCode>,
}

impl Timer {
    fn start() -> Self {
        Self { started: Instant::now(), status: None }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed: Duration = self.started.elapsed();
        match self.status {
            Some(status) => info!(status = status.as_u16(), ?elapsed, "request completed"),
            None => warn!(?elapsed, "request ended without a response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::middleware::MiddlewareChain;

    #[tokio::test]
    async fn passes_response_through_unchanged() {
        let pipeline = MiddlewareChain::new()
            .with(Trace)
            .wrap(|_req: Request| async { (StatusCode::ACCEPTED, "queued") });

        let req = http::Request::builder().uri("/jobs").body(Bytes::new()).unwrap();
        let res = pipeline.call(req).await;

        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
        assert_eq!(res.body().as_ref(), b"queued");
    }
}
