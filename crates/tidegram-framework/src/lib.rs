//! # tidegram framework
//!
//! Event dispatch for Telegram bots:
//! - Async, fallible [`Filter`]s with a non-short-circuiting algebra
//! - Onion-style [`Middleware`] chains, global and per handler
//! - Handlers with axum-style parameter injection ([`FromContext`])
//! - The [`Dispatcher`], which routes each update to its activated keys
//! - Bot command parsing ([`Command`])
//!
//! The framework knows nothing about how updates arrive. Update sources
//! (long polling, webhooks) live in `tidegram-transport` and call
//! [`Dispatcher::dispatch`] for each update.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod filters;
pub mod handler;
pub mod middleware;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandToken, shell_split};
pub use context::Context;
pub use dispatcher::Dispatcher;
pub use error::{ExtractError, ExtractResult, HandlerError, HandlerResult};
pub use extractor::FromContext;
pub use filter::{Filter, all_of, and, any_of, nand, none_of, not, or, xor};
pub use handler::{Callback, Handler, HandlerResponse};
pub use middleware::{Middleware, Next, compose};
