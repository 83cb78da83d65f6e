//! The executor seam every transport and middleware implements.
//!
//! Middleware is composed explicitly: a [`Layer`] takes the next executor in
//! the chain and returns a new executor wrapping it. Nothing is registered on
//! a shared mutable client.
//!
//! # Dyn Compatibility
//!
//! [`RequestExecutor`] returns an explicit `Pin<Box<dyn Future>>` instead of
//! using `async fn` so the chain can be stored as `Arc<dyn RequestExecutor>`.

use crate::error::Result;
use crate::request::{ApiRequest, ApiResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`RequestExecutor::execute`].
pub type ExecutorFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send + 'a>>;

/// Executes one [`ApiRequest`].
///
/// Implementations must map every failure into an [`crate::ApiError`]; raw
/// transport errors never cross this boundary.
pub trait RequestExecutor: Send + Sync {
    /// Execute the request.
    ///
    /// # Errors
    ///
    /// Returns the normalized error for any transport or server failure.
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_>;
}

impl<T: RequestExecutor + ?Sized> RequestExecutor for Arc<T> {
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_> {
        (**self).execute(request)
    }
}

impl<T: RequestExecutor + ?Sized> RequestExecutor for Box<T> {
    fn execute(&self, request: ApiRequest) -> ExecutorFuture<'_> {
        (**self).execute(request)
    }
}

/// Wraps an executor in middleware: `(next) -> executor`.
pub trait Layer<E> {
    /// The wrapped executor type.
    type Executor: RequestExecutor;

    /// Wrap `next` with this layer's behavior.
    fn layer(&self, next: E) -> Self::Executor;
}
