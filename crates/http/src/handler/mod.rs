//! Application request-handler seam.
//!
//! A [`Handler`] is the callback the server connection invokes once a full
//! request (headers plus any content) has been received. Handlers are
//! shared across connections behind an `Arc`, so they take `&self` and must
//! be `Send + Sync`.

use std::error::Error;
use std::future::Future;

use crate::protocol::{Request, Response};

/// Boxed error type handlers may fail with. The failure itself is opaque
/// to the engine: it is logged and surfaced to the peer as a synthesized
/// error response.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// An asynchronous request handler.
#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    async fn call(&self, request: Request) -> Result<Response, BoxError>;
}

/// Adapter turning an async function into a [`Handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, BoxError>> + Send,
{
    async fn call(&self, request: Request) -> Result<Response, BoxError> {
        (self.f)(request).await
    }
}

/// Wraps an async function as a [`Handler`].
pub fn make_handler<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, BoxError>> + Send,
{
    HandlerFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Method, StatusCode};

    #[tokio::test]
    async fn function_handler_is_invoked() {
        let handler = make_handler(|request: Request| async move {
            let mut response = Response::new(StatusCode::OK);
            response.fields_mut().append("X-Target", request.target());
            Ok(response)
        });

        let request = Request::new(Method::Get, "/ping");
        let response = Handler::call(&handler, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.fields().get("X-Target"), Some("/ping"));
    }
}
