//! Middleware and onion-style chain composition.
//!
//! A [`Middleware`] turns a continuation ([`Next`]) into a new continuation.
//! It can act before and after delegating, short-circuit by returning without
//! calling `next`, or fail.
//!
//! Chains are folded right to left, so the first middleware in a list is the
//! outermost one and observes every call first:
//!
//! ```text
//!   [m0, m1] around cb
//!
//!   m0 ──▶ m1 ──▶ cb
//!   m0 ◀── m1 ◀──┘
//! ```
//!
//! `Next` is a [`tower::Service`] and `Middleware` a [`tower_layer::Layer`],
//! so chains can also be assembled with `tower::ServiceBuilder`.

mod builtin;
mod recover;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::future::BoxFuture;
use tower::Service;
use tower_layer::Layer;

use crate::context::Context;
use crate::error::{HandlerError, HandlerResult};
use crate::filter::Filter;

pub use builtin::{
    IdSet, blacklist, callback_query, chat_member, command, id_set, regex, text, whitelist,
};
pub use recover::{recover, recover_with};

// ============================================================================
// Next
// ============================================================================

type NextFn = dyn Fn(Arc<Context>) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A continuation: the rest of a chain, down to the terminal callback.
#[derive(Clone)]
pub struct Next(Arc<NextFn>);

impl Next {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    /// A continuation that does nothing.
    pub fn noop() -> Self {
        Self::new(|_| async { Ok(()) })
    }

    /// Runs the continuation.
    pub fn run(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

impl Service<Arc<Context>> for Next {
    type Response = ();
    type Error = HandlerError;
    type Future = BoxFuture<'static, HandlerResult>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<Context>) -> Self::Future {
        self.run(ctx)
    }
}

// ============================================================================
// Middleware
// ============================================================================

type WrapFn = dyn Fn(Next) -> Next + Send + Sync;

/// Wraps a continuation.
#[derive(Clone)]
pub struct Middleware(Arc<WrapFn>);

impl Middleware {
    /// Creates a middleware from a continuation transformer.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Next) -> Next + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Creates a middleware from an async function of the context and the
    /// continuation.
    ///
    /// ```rust,ignore
    /// let timing = Middleware::around(|ctx, next| async move {
    ///     let start = Instant::now();
    ///     let result = next.run(ctx).await;
    ///     debug!(elapsed = ?start.elapsed(), "handled");
    ///     result
    /// });
    /// ```
    pub fn around<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Context>, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |next| {
            let f = Arc::clone(&f);
            Next::new(move |ctx| f(ctx, next.clone()))
        })
    }

    /// Gates the continuation behind `filter`.
    ///
    /// A filter error propagates, `false` ends the chain with `Ok(())`, and
    /// `true` runs the continuation.
    pub fn from_filter(filter: Filter) -> Self {
        Self::around(move |ctx, next| {
            let filter = filter.clone();
            async move {
                if filter.check(Arc::clone(&ctx)).await? {
                    next.run(ctx).await
                } else {
                    Ok(())
                }
            }
        })
    }

    /// Stops the chain unconditionally.
    pub fn stop() -> Self {
        Self::new(|_| Next::new(|_| async { Err(HandlerError::StopPropagation) }))
    }

    /// Wraps `next`.
    pub fn wrap(&self, next: Next) -> Next {
        (self.0)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

impl From<Filter> for Middleware {
    fn from(filter: Filter) -> Self {
        Self::from_filter(filter)
    }
}

impl Layer<Next> for Middleware {
    type Service = Next;

    fn layer(&self, inner: Next) -> Next {
        self.wrap(inner)
    }
}

/// Folds `middlewares` around `terminal`, first element outermost.
pub fn compose(middlewares: &[Middleware], terminal: Next) -> Next {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.layer(next))
}
