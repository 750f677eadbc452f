use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::error;

use super::{Middleware, Next};
use crate::context::Context;
use crate::error::HandlerError;

/// Catches panics in the rest of the chain.
///
/// The panic becomes [`HandlerError::Panicked`], which the dispatcher logs
/// like any other failure before moving on to the next handler.
pub fn recover() -> Middleware {
    recover_with(|ctx, err| {
        error!(update_id = ctx.update_id(), error = %err, "recovered from panic");
    })
}

/// Like [`recover`], calling `on_error` with the converted panic before
/// returning it.
pub fn recover_with<F>(on_error: F) -> Middleware
where
    F: Fn(&Context, &HandlerError) + Send + Sync + 'static,
{
    let on_error = Arc::new(on_error);
    Middleware::around(move |ctx, next: Next| {
        let on_error = Arc::clone(&on_error);
        async move {
            let inner = Arc::clone(&ctx);
            let outcome = AssertUnwindSafe(async move { next.run(inner).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let err = HandlerError::Panicked(panic_message(payload.as_ref()));
                    on_error(&ctx, &err);
                    Err(err)
                }
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::middleware::compose;
    use crate::testing::{ctx, text_message};
    use parking_lot::Mutex;

    async fn explode(_: Arc<Context>) -> HandlerResult {
        panic!("kaboom")
    }

    async fn explode_with_id(ctx: Arc<Context>) -> HandlerResult {
        panic!("update {} failed", ctx.update_id())
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let chain = compose(
            &[recover_with(move |_, err| {
                *seen_clone.lock() = Some(err.to_string());
            })],
            Next::new(explode),
        );

        let result = chain.run(ctx(text_message("hi"))).await;

        assert!(matches!(result, Err(HandlerError::Panicked(ref m)) if m == "kaboom"));
        assert_eq!(seen.lock().as_deref(), Some("handler panicked: kaboom"));
    }

    #[tokio::test]
    async fn test_formatted_panic_message() {
        let chain = recover().wrap(Next::new(explode_with_id));
        let result = chain.run(ctx(text_message("hi"))).await;
        assert!(matches!(result, Err(HandlerError::Panicked(ref m)) if m == "update 1 failed"));
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let chain = recover().wrap(Next::new(|_| async { Err(HandlerError::StopPropagation) }));
        let result = chain.run(ctx(text_message("hi"))).await;
        assert!(result.is_err_and(|e| e.is_stop()));
    }
}
