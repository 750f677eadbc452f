use async_trait::async_trait;

use crate::context::Context;
use crate::error::{HandlerError, HandlerResult};

// ============================================================================
// HandlerResponse - Handle callback return values
// ============================================================================

/// A callback return value that can be turned into a chain result.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    async fn into_result(self, ctx: &Context) -> HandlerResult;
}

/// No response needed.
#[async_trait]
impl HandlerResponse for () {
    async fn into_result(self, _ctx: &Context) -> HandlerResult {
        Ok(())
    }
}

/// Sends the string to the event's chat.
#[async_trait]
impl HandlerResponse for String {
    async fn into_result(self, ctx: &Context) -> HandlerResult {
        ctx.send(self).await.map(drop)
    }
}

#[async_trait]
impl HandlerResponse for &'static str {
    async fn into_result(self, ctx: &Context) -> HandlerResult {
        ctx.send(self).await.map(drop)
    }
}

/// On `Some`, the inner value's response is handled. On `None`, nothing
/// happens.
#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn into_result(self, ctx: &Context) -> HandlerResult {
        match self {
            Some(t) => t.into_result(ctx).await,
            None => Ok(()),
        }
    }
}

/// On `Ok`, the inner value's response is handled. `Err` fails the chain.
#[async_trait]
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<HandlerError> + Send + 'static,
{
    async fn into_result(self, ctx: &Context) -> HandlerResult {
        match self {
            Ok(t) => t.into_result(ctx).await,
            Err(e) => Err(e.into()),
        }
    }
}
