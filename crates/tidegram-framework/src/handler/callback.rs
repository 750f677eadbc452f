use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::response::HandlerResponse;
use crate::context::Context;
use crate::error::HandlerResult;
use crate::extractor::FromContext;

/// An async function usable as a handler callback.
///
/// Implemented for functions and closures that:
/// - Take 0-6 parameters implementing [`FromContext`]
/// - Return a type implementing [`HandlerResponse`]
///
/// ```rust,ignore
/// async fn ping() -> &'static str {
///     "pong"
/// }
///
/// async fn echo(message: Arc<Message>) -> Option<String> {
///     message.text.clone()
/// }
///
/// async fn greet(ctx: Arc<Context>, user: User) -> HandlerResult {
///     ctx.reply(format!("hi {}", user.first_name)).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Callback<T>: Clone + Send + Sync + 'static {
    /// Extracts the parameters, calls the function and handles its response.
    async fn call(self, ctx: Arc<Context>) -> HandlerResult;
}

macro_rules! impl_callback {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Callback<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<Context>) -> HandlerResult {
                $(
                    let $ty = $ty::from_context(&ctx)?;
                )*

                let res = (self)($($ty,)*).await;
                res.into_result(&ctx).await
            }
        }
    };
}

impl_callback!();
impl_callback!(T1);
impl_callback!(T1, T2);
impl_callback!(T1, T2, T3);
impl_callback!(T1, T2, T3, T4);
impl_callback!(T1, T2, T3, T4, T5);
impl_callback!(T1, T2, T3, T4, T5, T6);
