//! Bot command parsing.
//!
//! A command is recognised only when a `bot_command` entity starts at offset
//! 0 of the message text. The token is split into its name and an optional
//! `@botname` mention; whatever follows is the argument text.
//!
//! ```rust,ignore
//! dispatcher.on_command("ban", |cmd: Command| async move {
//!     // "/ban@mybot 42 \"too much spam\""
//!     assert_eq!(cmd.name, "ban");
//!     assert_eq!(cmd.mention.as_deref(), Some("mybot"));
//!     assert_eq!(cmd.args, ["42", "too much spam"]);
//! });
//! ```

mod split;

pub use split::shell_split;

use std::sync::Arc;

use tidegram_core::Message;

use crate::context::Context;
use crate::error::{ExtractError, ExtractResult};
use crate::extractor::FromContext;

/// A borrowed view of a leading bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandToken<'a> {
    /// Command name without the leading `/`.
    pub name: &'a str,
    /// Bot username after `@`, if present.
    pub mention: Option<&'a str>,
    /// The rest of the text, trimmed.
    pub args: &'a str,
}

impl<'a> CommandToken<'a> {
    /// Parses the leading command of `message`.
    pub fn parse(message: &'a Message) -> Option<Self> {
        let token = message.leading_command()?;
        let text = message.text.as_deref()?;
        let args = text.get(token.len()..).unwrap_or_default().trim();

        let token = token.strip_prefix('/').unwrap_or(token);
        let (name, mention) = match token.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (token, None),
        };

        Some(Self {
            name,
            mention,
            args,
        })
    }
}

/// Owned command extractor with shell-split arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub mention: Option<String>,
    /// Argument text as sent.
    pub raw_args: String,
    /// Argument text split like a shell would.
    pub args: Vec<String>,
}

impl From<CommandToken<'_>> for Command {
    fn from(token: CommandToken<'_>) -> Self {
        Self {
            name: token.name.to_string(),
            mention: token.mention.map(str::to_string),
            raw_args: token.args.to_string(),
            args: shell_split(token.args),
        }
    }
}

impl FromContext for Command {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.message()
            .and_then(CommandToken::parse)
            .map(Command::from)
            .ok_or_else(|| ExtractError::missing("command", ctx.update_type()))
    }
}
