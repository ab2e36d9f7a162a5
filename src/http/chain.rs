//! Ordered chain of self-selecting request handlers.
//!
//! # Responsibilities
//! - Hold the handlers configured at startup, in order
//! - Run every applicable handler for a request and write what it produces
//!
//! # Design Decisions
//! - Every handler is visited; an earlier response does not stop the chain
//! - Applicability is an explicit predicate, testable on its own
//! - A failing handler aborts the chain; the caller turns that into a 500

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::AsyncWrite;

use crate::error::HandlerError;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseWriter};

/// Future returned by [`RequestHandler::handle`].
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Response>, HandlerError>> + Send + 'a>>;

/// A handler in the chain.
pub trait RequestHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this handler wants to act on the request.
    fn applies(&self, request: &Request) -> bool;

    /// Produce a response for an applicable request, or `None` to pass.
    fn handle<'a>(&'a self, request: &'a Request) -> HandlerFuture<'a>;
}

/// Why a chain run stopped early.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("handler \"{handler}\" failed: {source}")]
    Handler {
        handler: &'static str,
        #[source]
        source: HandlerError,
    },

    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed, ordered sequence of handlers.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn RequestHandler>>) -> Self {
        Self { handlers }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run the chain, writing each produced response. Returns how many handlers responded.
    pub async fn run<W>(
        &self,
        request: &Request,
        writer: &mut ResponseWriter<W>,
    ) -> Result<usize, ChainError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut handled = 0;
        for handler in &self.handlers {
            if !handler.applies(request) {
                tracing::trace!(
                    request_id = %request.id(),
                    handler = handler.name(),
                    "Handler skipped"
                );
                continue;
            }

            let response = handler
                .handle(request)
                .await
                .map_err(|source| ChainError::Handler {
                    handler: handler.name(),
                    source,
                })?;

            if let Some(response) = response {
                tracing::debug!(
                    request_id = %request.id(),
                    handler = handler.name(),
                    status = response.status().code(),
                    "Handler responded"
                );
                writer.write(&response).await?;
                handled += 1;
            }
        }
        Ok(handled)
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::Status;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        json_only: bool,
        fail: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RequestHandler for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn applies(&self, request: &Request) -> bool {
            request.is_json_request() == self.json_only
        }

        fn handle<'a>(&'a self, _request: &'a Request) -> HandlerFuture<'a> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(self.name);
                if self.fail {
                    return Err(HandlerError::Invocation {
                        route: "/boom".into(),
                        source: "boom".into(),
                    });
                }
                Ok(Some(Response::plain(Status::Ok, self.name)))
            })
        }
    }

    struct Passing(Arc<AtomicUsize>);

    impl RequestHandler for Passing {
        fn name(&self) -> &'static str {
            "passing"
        }

        fn applies(&self, _request: &Request) -> bool {
            true
        }

        fn handle<'a>(&'a self, _request: &'a Request) -> HandlerFuture<'a> {
            Box::pin(async move {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
        }
    }

    fn request(accept: &str) -> Request {
        let mut headers = std::collections::HashMap::new();
        headers.insert("Accept".to_string(), accept.to_string());
        Request::from_parts(
            "GET".into(),
            "GET / HTTP/1.1".into(),
            "/".into(),
            headers,
            None,
        )
    }

    fn recording(
        name: &'static str,
        json_only: bool,
        fail: bool,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn RequestHandler> {
        Arc::new(Recording {
            name,
            json_only,
            fail,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn only_applicable_handlers_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(AtomicUsize::new(0));
        let passing: Arc<dyn RequestHandler> = Arc::new(Passing(seen.clone()));
        let chain = HandlerChain::new(vec![
            passing,
            recording("json", true, false, &calls),
            recording("static", false, false, &calls),
        ]);

        let mut writer = ResponseWriter::new(Vec::new());
        let handled = chain.run(&request("application/json"), &mut writer).await.unwrap();

        assert_eq!(handled, 1);
        assert_eq!(*calls.lock().unwrap(), vec!["json"]);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        let wire = String::from_utf8(writer.into_inner()).unwrap();
        assert!(wire.ends_with("json"));
    }

    #[tokio::test]
    async fn earlier_response_does_not_stop_the_chain() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = HandlerChain::new(vec![
            recording("first", false, false, &calls),
            recording("second", false, false, &calls),
        ]);

        let mut writer = ResponseWriter::new(Vec::new());
        let handled = chain.run(&request("text/html"), &mut writer).await.unwrap();
        assert_eq!(handled, 2);
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_handler_aborts_the_chain() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = HandlerChain::new(vec![
            recording("broken", false, true, &calls),
            recording("after", false, false, &calls),
        ]);

        let mut writer = ResponseWriter::new(Vec::new());
        let err = chain.run(&request("text/html"), &mut writer).await.unwrap_err();
        assert!(matches!(err, ChainError::Handler { handler: "broken", .. }));
        assert_eq!(*calls.lock().unwrap(), vec!["broken"]);
        assert!(!writer.is_committed());
    }
}
