//! Filters and the filter algebra.
//!
//! A [`Filter`] is an async predicate over a [`Context`]. It may call the Bot
//! API (see [`filters::chat_member`](crate::filters::chat_member)) and may
//! therefore fail; failures propagate through every combinator.
//!
//! # Evaluation order
//!
//! The binary combinators never short-circuit: both operands always run, left
//! first, so filters with side effects (remote lookups, audit logging) behave
//! the same regardless of their position. The only early exit is an error
//! from the left operand, which aborts before the right one runs.
//!
//! ```rust,ignore
//! use tidegram_framework::filter::{all_of, not};
//! use tidegram_framework::filters;
//!
//! let admins_only = filters::command("ban") & filters::chat_member("-100123");
//! let quiet = not(filters::text("spam", false, false));
//! let both = all_of([admins_only, quiet]).expect("non-empty");
//! ```

use std::fmt;
use std::future::Future;
use std::ops;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;

type FilterFn = dyn Fn(Arc<Context>) -> BoxFuture<'static, HandlerResult<bool>> + Send + Sync;

/// An async, fallible predicate over a dispatch context.
///
/// Cloning is cheap; clones share the same predicate.
#[derive(Clone)]
pub struct Filter(Arc<FilterFn>);

impl Filter {
    /// Creates a filter from an async predicate.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<bool>> + Send + 'static,
    {
        Self(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    /// Creates a filter from a synchronous, infallible predicate.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |ctx| {
            let matched = f(&ctx);
            Box::pin(async move { Ok(matched) })
        }))
    }

    /// A filter that always yields `value`.
    pub fn always(value: bool) -> Self {
        Self::sync(move |_| value)
    }

    /// Evaluates the filter.
    pub fn check(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult<bool>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter")
    }
}

// ============================================================================
// Combinators
// ============================================================================

/// Evaluates both operands and combines their results with `op`.
fn binary(a: Filter, b: Filter, op: fn(bool, bool) -> bool) -> Filter {
    Filter::new(move |ctx| {
        let (a, b) = (a.clone(), b.clone());
        async move {
            let left = a.check(Arc::clone(&ctx)).await?;
            let right = b.check(ctx).await?;
            Ok(op(left, right))
        }
    })
}

/// `a ∧ b`. Both operands are evaluated.
pub fn and(a: Filter, b: Filter) -> Filter {
    binary(a, b, |x, y| x && y)
}

/// `a ∨ b`. Both operands are evaluated.
pub fn or(a: Filter, b: Filter) -> Filter {
    binary(a, b, |x, y| x || y)
}

/// `¬(a ∧ b)`. Both operands are evaluated.
pub fn nand(a: Filter, b: Filter) -> Filter {
    binary(a, b, |x, y| !(x && y))
}

/// True iff exactly one operand holds. Both operands are evaluated.
pub fn xor(a: Filter, b: Filter) -> Filter {
    binary(a, b, |x, y| x != y)
}

/// Negates `a`. Errors pass through unchanged.
pub fn not(a: Filter) -> Filter {
    Filter::new(move |ctx| {
        let a = a.clone();
        async move { Ok(!a.check(ctx).await?) }
    })
}

/// Left fold of [`and`].
///
/// Returns `None` for an empty input: there is no meaningful conjunction of
/// zero filters, and guessing one would silently match or drop everything.
pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
    filters.into_iter().reduce(and)
}

/// Left fold of [`or`]. Returns `None` for an empty input.
pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
    filters.into_iter().reduce(or)
}

/// True iff none of the filters match. Returns `None` for an empty input.
pub fn none_of(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
    filters.into_iter().map(not).reduce(and)
}

impl ops::BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        and(self, rhs)
    }
}

impl ops::BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        or(self, rhs)
    }
}

impl ops::BitXor for Filter {
    type Output = Filter;

    fn bitxor(self, rhs: Filter) -> Filter {
        xor(self, rhs)
    }
}

impl ops::Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        not(self)
    }
}
