//! Handlers: a callback plus its own middleware chain.
//!
//! - **Callback** ([`Callback`]) adapts async functions with parameter
//!   injection, similar to axum's handler system
//! - **Response** ([`HandlerResponse`]) turns the return value into a chain
//!   result, sending strings as messages
//!
//! # Architecture
//!
//! A [`Handler`] is registered under one update type. At dispatch time its
//! middleware list is folded around the callback, and the dispatcher's global
//! middleware is folded around that:
//!
//! ```text
//! global[0] ─▶ global[1] ─▶ local[0] ─▶ local[1] ─▶ callback
//! ```
//!
//! Middleware attached through [`Handler::with`] runs after anything the
//! registration method inserted (the command filter of `on_command`, for
//! instance).

mod callback;
mod response;

pub use callback::Callback;
pub use response::HandlerResponse;

use std::fmt;

use crate::middleware::{Middleware, Next, compose};

/// A callback with handler-scoped middleware.
#[derive(Clone)]
pub struct Handler {
    name: Option<String>,
    middlewares: Vec<Middleware>,
    callback: Next,
}

impl Handler {
    /// Creates a handler with no middleware.
    pub fn new<C, T>(callback: C) -> Self
    where
        C: Callback<T>,
        T: 'static,
    {
        Self::from_next(Next::new(move |ctx| callback.clone().call(ctx)))
    }

    /// Creates a handler from a raw continuation.
    pub fn from_next(callback: Next) -> Self {
        Self {
            name: None,
            middlewares: Vec::new(),
            callback,
        }
    }

    /// Appends a middleware (or a filter) to this handler's chain.
    ///
    /// Appended middleware runs inside everything added before it.
    pub fn with(&mut self, middleware: impl Into<Middleware>) -> &mut Self {
        self.middlewares.push(middleware.into());
        self
    }

    /// Names the handler for logs.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// The handler's own chain composed around its callback.
    pub fn service(&self) -> Next {
        compose(&self.middlewares, self.callback.clone())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
