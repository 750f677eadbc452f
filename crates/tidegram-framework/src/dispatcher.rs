//! Update routing.
//!
//! The [`Dispatcher`] owns the registry: an ordered list of [`Handler`]s per
//! [`UpdateType`], plus a global middleware chain shared by all of them.
//!
//! # Dispatch
//!
//! For one [`Update`]:
//!
//! 1. Every activated key is resolved. A message activates `Message` and,
//!    independently, one media key per populated media field
//! 2. Each activation gets its own [`Context`]
//! 3. Every handler under the key runs in registration order, wrapped in the
//!    global chain
//! 4. [`HandlerError::StopPropagation`] ends only that handler's chain; other
//!    errors are logged. Neither stops the sibling handlers
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.use_middleware(middleware::recover());
//! dispatcher.on_command("start", || async { "hello!" });
//! dispatcher
//!     .on_message(echo)
//!     .with(filters::whitelist(admins.clone()));
//!
//! let dispatcher = Arc::new(dispatcher);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tidegram_core::{BoxedBot, Update, UpdateType};
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::context::Context;
use crate::filters;
use crate::handler::{Callback, Handler};
use crate::middleware::{Middleware, compose};

/// Routes updates to registered handlers.
///
/// Registration needs `&mut self`; once the dispatcher is shared behind an
/// `Arc` the registry is read-only and `dispatch` may run concurrently.
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<UpdateType, Vec<Handler>>,
    middlewares: Vec<Middleware>,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the global chain.
    ///
    /// Global middleware wraps every handler's own chain, first added
    /// outermost.
    pub fn use_middleware(&mut self, middleware: impl Into<Middleware>) -> &mut Self {
        self.middlewares.push(middleware.into());
        self
    }

    /// Registers a prepared handler under `kind`.
    pub fn register(&mut self, kind: UpdateType, handler: Handler) -> &mut Handler {
        let handlers = self.handlers.entry(kind).or_default();
        handlers.push(handler);
        let last = handlers.len() - 1;
        &mut handlers[last]
    }

    /// Registers `callback` under `kind`.
    pub fn on<C, T>(&mut self, kind: UpdateType, callback: C) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        self.register(kind, Handler::new(callback))
    }

    /// Registers `callback` under `kind` behind a filter.
    fn on_filtered<C, T>(
        &mut self,
        kind: UpdateType,
        filter: impl Into<Middleware>,
        callback: C,
    ) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        let mut handler = Handler::new(callback);
        handler.with(filter);
        self.register(kind, handler)
    }

    pub fn on_message<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Message, callback)
    }

    pub fn on_edited_message<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::EditedMessage, callback)
    }

    pub fn on_channel_post<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::ChannelPost, callback)
    }

    pub fn on_edited_channel_post<C: Callback<T>, T: 'static>(
        &mut self,
        callback: C,
    ) -> &mut Handler {
        self.on(UpdateType::EditedChannelPost, callback)
    }

    pub fn on_business_message<C: Callback<T>, T: 'static>(
        &mut self,
        callback: C,
    ) -> &mut Handler {
        self.on(UpdateType::BusinessMessage, callback)
    }

    pub fn on_edited_business_message<C: Callback<T>, T: 'static>(
        &mut self,
        callback: C,
    ) -> &mut Handler {
        self.on(UpdateType::EditedBusinessMessage, callback)
    }

    pub fn on_animation<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Animation, callback)
    }

    pub fn on_audio<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Audio, callback)
    }

    pub fn on_document<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Document, callback)
    }

    /// Registers a handler for messages carrying a photo.
    pub fn on_photo<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Photo, callback)
    }

    pub fn on_video<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Video, callback)
    }

    pub fn on_voice<C: Callback<T>, T: 'static>(&mut self, callback: C) -> &mut Handler {
        self.on(UpdateType::Voice, callback)
    }

    /// Registers a message handler behind [`filters::command`].
    pub fn on_command<C, T>(&mut self, command: impl Into<String>, callback: C) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        self.on_filtered(UpdateType::Message, filters::command(command), callback)
    }

    /// Registers a message handler behind [`filters::text`].
    pub fn on_text<C, T>(
        &mut self,
        text: impl Into<String>,
        strict: bool,
        case_sensitive: bool,
        callback: C,
    ) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        self.on_filtered(
            UpdateType::Message,
            filters::text(text, strict, case_sensitive),
            callback,
        )
    }

    /// Registers a message handler behind a case-sensitive [`filters::regex`].
    pub fn on_regex<C, T>(&mut self, re: Regex, callback: C) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        self.on_filtered(UpdateType::Message, filters::regex(re, true), callback)
    }

    /// Registers a callback query handler behind [`filters::callback_query`].
    pub fn on_callback_query<C, T>(
        &mut self,
        data: impl Into<String>,
        strict: bool,
        callback: C,
    ) -> &mut Handler
    where
        C: Callback<T>,
        T: 'static,
    {
        self.on_filtered(
            UpdateType::CallbackQuery,
            filters::callback_query(data, strict),
            callback,
        )
    }

    /// Number of handlers registered under `kind`.
    pub fn handler_count(&self, kind: UpdateType) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Dispatches one update to every handler it activates.
    ///
    /// Handler failures are logged, never returned.
    pub async fn dispatch(&self, bot: BoxedBot, update: Update) {
        let span = debug_span!("dispatch", update_id = update.update_id);
        self.dispatch_inner(bot, update).instrument(span).await;
    }

    async fn dispatch_inner(&self, bot: BoxedBot, update: Update) {
        let activations = update.activations();
        if activations.is_empty() {
            trace!("update carries no supported payload");
            return;
        }

        for (kind, event) in activations {
            let Some(handlers) = self.handlers.get(&kind) else {
                trace!(update_type = %kind, "no handlers registered");
                continue;
            };

            let ctx = Arc::new(Context::new(
                Arc::clone(&bot),
                update.update_id,
                kind,
                event,
            ));

            let span = debug_span!("handle", update_type = %kind);
            async {
                for (index, handler) in handlers.iter().enumerate() {
                    let name = handler.name().unwrap_or("unnamed");
                    let chain = compose(&self.middlewares, handler.service());

                    match chain.run(Arc::clone(&ctx)).await {
                        Ok(()) => trace!(handler = name, index, "handler completed"),
                        Err(e) if e.is_stop() => {
                            debug!(handler = name, index, "propagation stopped")
                        }
                        Err(e) => error!(handler = name, index, error = %e, "handler failed"),
                    }
                }
            }
            .instrument(span)
            .await;
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<_> = self
            .handlers
            .iter()
            .map(|(kind, handlers)| (*kind, handlers.len()))
            .collect();
        counts.sort();
        f.debug_struct("Dispatcher")
            .field("handlers", &counts)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
