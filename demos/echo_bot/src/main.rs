//! Echo Bot Example
//!
//! Demonstrates handler registration, filters and middleware:
//!
//! - `/start`, `/echo <text>`, `/poll` commands
//! - inline keyboard buttons answered through `on_callback_query`
//! - a photo handler that runs next to the generic message logger
//! - an admin-only `/stats` command gated by a live whitelist
//!
//! # Usage
//!
//! ```bash
//! TIDEGRAM_BOT__TOKEN=123456:ABC cargo run --package echo-bot -- --admin 42
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use clap::Parser;
use regex::Regex;
use tidegram::prelude::*;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "tidegram echo bot")]
struct Args {
    /// Configuration file; searched in the working directory when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// User ids allowed to run /stats.
    #[arg(long = "admin")]
    admins: Vec<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn start(user: Option<User>) -> String {
    let name = user.map_or_else(|| "there".to_string(), |u| u.first_name);
    format!("Hi {name}! Send /echo <text>, /poll, or a photo.")
}

async fn echo(cmd: Command) -> String {
    if cmd.raw_args.is_empty() {
        "Usage: /echo <text>".to_string()
    } else {
        cmd.raw_args
    }
}

async fn poll(ctx: Arc<Context>) -> HandlerResult {
    let Some(chat) = ctx.chat() else {
        return Ok(());
    };

    let keyboard = InlineKeyboardMarkup::default().row([
        InlineKeyboardButton::callback("👍", "vote:up"),
        InlineKeyboardButton::callback("👎", "vote:down"),
    ]);
    let params = SendMessageParams::new(chat.id, "Do you like tidegram?").reply_markup(keyboard);
    ctx.bot().send_message(&params).await?;
    Ok(())
}

async fn vote(ctx: Arc<Context>, query: Arc<CallbackQuery>) -> HandlerResult {
    let choice = query
        .data
        .as_deref()
        .and_then(|data| data.strip_prefix("vote:"))
        .unwrap_or("?");

    let params = AnswerCallbackQueryParams::new(query.id.clone()).text(format!("Voted {choice}"));
    ctx.bot().answer_callback_query(&params).await?;
    ctx.edit_text(format!("Thanks for voting {choice}!")).await?;
    Ok(())
}

async fn photo(message: Arc<Message>) -> Option<String> {
    let size = message.largest_photo()?;
    Some(format!("Nice photo! {}x{}", size.width, size.height))
}

async fn greeting(ctx: Arc<Context>) -> HandlerResult {
    ctx.reply("Hello to you too!").await?;
    Ok(())
}

fn log_message(message: Arc<Message>) -> std::future::Ready<()> {
    let sender = message
        .from
        .as_ref()
        .map_or_else(|| "unknown".to_string(), User::full_name);
    info!(
        chat_id = message.chat.id,
        sender = %sender,
        text = message.text_or_caption().unwrap_or_default(),
        "message received"
    );
    std::future::ready(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = Runtime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder
        .on_start(|_, me: User| async move {
            info!(username = ?me.username, "echo bot is up");
        })
        .build()?;

    let handled = Arc::new(AtomicU64::new(0));
    let admins = filters::id_set(args.admins.iter().copied());

    let mut dispatcher = Dispatcher::new();

    // Outermost first: panics are caught before they reach the counter.
    dispatcher.use_middleware(middleware::recover());
    dispatcher.use_middleware({
        let handled = Arc::clone(&handled);
        Middleware::around(move |ctx, next: Next| {
            handled.fetch_add(1, Ordering::Relaxed);
            next.run(ctx)
        })
    });

    dispatcher.on_message(log_message);
    dispatcher.on_command("start", start);
    dispatcher.on_command("echo", echo);
    dispatcher.on_command("poll", poll);
    dispatcher.on_callback_query("vote:", false, vote);
    dispatcher.on_photo(photo);
    dispatcher.on_regex(Regex::new(r"^(hi|hello|hey)\b")?, greeting);
    dispatcher
        .on_command("stats", move || {
            let count = handled.load(Ordering::Relaxed);
            async move { format!("{count} handler activations so far") }
        })
        .with(filters::whitelist(admins))
        .named("stats");

    runtime.run(dispatcher).await?;
    Ok(())
}
