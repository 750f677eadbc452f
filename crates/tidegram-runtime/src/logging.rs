//! Logging setup on `tracing-subscriber`.
//!
//! Dispatch runs inside a `dispatch` span per update and a `handle` span per
//! routing key. [`LoggingBuilder::trace_dispatch`] turns both on together
//! with the per-handler `trace!` lines:
//!
//! ```rust,ignore
//! use tidegram_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .trace_dispatch()
//!     .redact("123456:ABC-token")
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, replaces the configured base level and the default
//! caps on the HTTP stack. Registered secrets are masked in every sink, so a
//! request URL logged by a dependency never leaks the bot token.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig, TidegramConfig};

/// Directives applied when `RUST_LOG` is unset and dependencies are quiet.
const QUIET_DEPENDENCIES: [&str; 4] = ["hyper=warn", "hyper_util=warn", "h2=warn", "reqwest=warn"];

/// Replacement for redacted secrets.
const REDACTED: &str = "[redacted]";

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

impl SpanEvents {
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Creation and close, which brackets each update's dispatch and each
    /// routing key's handler run.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.enter {
            span |= fmt::format::FmtSpan::ENTER;
        }
        if self.exit {
            span |= fmt::format::FmtSpan::EXIT;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when a subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Like [`init_from_config`], masking the bot token and webhook secret.
pub fn init_for(config: &TidegramConfig) {
    let mut builder = LoggingBuilder::from_config(&config.logging).redact(&config.bot.token);
    if let Some(secret) = config.webhook.as_ref().and_then(|w| w.secret_token.as_deref()) {
        builder = builder.redact(secret);
    }
    let _ = builder.try_init();
}

// =============================================================================
// Redaction
// =============================================================================

/// A [`MakeWriter`] masking secrets in everything written through it.
///
/// The fmt layer writes each formatted event in one call, so a secret is
/// never split across two writes.
#[derive(Clone)]
struct Redacting<M> {
    inner: M,
    secrets: Arc<[String]>,
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for Redacting<M> {
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            secrets: Arc::clone(&self.secrets),
        }
    }
}

struct RedactingWriter<W> {
    inner: W,
    secrets: Arc<[String]>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        if !self.secrets.iter().any(|s| text.contains(s.as_str())) {
            return self.inner.write(buf);
        }

        let masked = self
            .secrets
            .iter()
            .fold(text.into_owned(), |acc, secret| acc.replace(secret.as_str(), REDACTED));
        self.inner.write_all(masked.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// Builder for the global `tracing` subscriber.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
    file_path: Option<PathBuf>,
    quiet_dependencies: bool,
    secrets: Vec<String>,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            with_target: true,
            quiet_dependencies: true,
            ..Default::default()
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();

        builder.level = config.level.parse().ok();
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = SpanEvents::from(&config.span_events);
        builder.with_thread_ids = config.thread_ids;
        builder.with_file = config.file_location;
        builder.with_line_number = config.file_location;
        builder.file_path.clone_from(&config.file_path);
        builder.quiet_dependencies = config.quiet_dependencies;

        for (target, level) in &config.filters {
            builder
                .directives
                .push(format!("{}={}", target, level.to_lowercase()));
        }

        builder
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds an `EnvFilter` directive such as `tidegram_transport=debug`.
    /// Directives that fail to parse are ignored.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Logs every filter and handler step with the span lifecycle around it.
    pub fn trace_dispatch(self) -> Self {
        self.directive("tidegram_framework=trace")
            .span_events(SpanEvents::LIFECYCLE)
    }

    /// Masks `secret` wherever it shows up in log output. Empty strings are
    /// ignored.
    pub fn redact(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    pub fn quiet_dependencies(mut self, enabled: bool) -> Self {
        self.quiet_dependencies = enabled;
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Target file for [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Directives in application order: dependency caps first, so explicit
    /// directives for the same targets win.
    fn effective_directives(&self, from_env: bool) -> Vec<&str> {
        let quiet = self.quiet_dependencies && !from_env;
        QUIET_DEPENDENCIES
            .iter()
            .copied()
            .filter(|_| quiet)
            .chain(self.directives.iter().map(String::as_str))
            .collect()
    }

    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        let (mut filter, from_env) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(&base_filter), false),
        };

        for directive in self.effective_directives(from_env) {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Fails when a global subscriber is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let span_events = self.span_events.to_fmt_span();
        let secrets: Arc<[String]> = self.secrets.clone().into();

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events)
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        macro_rules! init_with_writer {
            ($writer:expr) => {
                match &self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => {
                        let layer = fmt::layer()
                            .json()
                            .with_span_events(span_events)
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    #[cfg(not(feature = "json-log"))]
                    LogFormat::Json | LogFormat::Compact => {
                        let layer = configure_layer!(fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    #[cfg(feature = "json-log")]
                    LogFormat::Compact => {
                        let layer = configure_layer!(fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Full => {
                        let layer = configure_layer!(fmt::layer().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer = configure_layer!(fmt::layer().pretty().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            };
        }

        match &self.output {
            LogOutput::Stdout => init_with_writer!(Redacting {
                inner: io::stdout as fn() -> io::Stdout,
                secrets: Arc::clone(&secrets),
            }),
            LogOutput::Stderr => init_with_writer!(Redacting {
                inner: io::stderr as fn() -> io::Stderr,
                secrets: Arc::clone(&secrets),
            }),
            LogOutput::File => {
                if let Some(path) = &self.file_path {
                    let file_appender = tracing_appender::rolling::never(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name()
                            .unwrap_or_else(|| OsStr::new("tidegram.log")),
                    );
                    init_with_writer!(Redacting {
                        inner: file_appender,
                        secrets: Arc::clone(&secrets),
                    })
                } else {
                    let result = init_with_writer!(Redacting {
                        inner: io::stdout as fn() -> io::Stdout,
                        secrets: Arc::clone(&secrets),
                    });
                    warn!("File output requested but no file path configured, logging to stdout");
                    result
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    fn redacting(buffer: &Buffer, secrets: &[&str]) -> Redacting<impl Fn() -> Buffer + use<>> {
        let buffer = buffer.clone();
        Redacting {
            inner: move || buffer.clone(),
            secrets: secrets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_span_events_flags() {
        assert_eq!(SpanEvents::NONE.to_fmt_span(), fmt::format::FmtSpan::NONE);
        assert_eq!(
            SpanEvents::LIFECYCLE.to_fmt_span(),
            fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
        );
        assert_eq!(SpanEvents::FULL.to_fmt_span(), fmt::format::FmtSpan::FULL);
    }

    #[test]
    fn test_from_config() {
        let mut config = LoggingConfig {
            level: "DEBUG".to_string(),
            format: LogFormat::Pretty,
            thread_ids: true,
            file_location: true,
            quiet_dependencies: false,
            span_events: SpanEventConfig {
                close: true,
                ..Default::default()
            },
            ..Default::default()
        };
        config
            .filters
            .insert("tidegram_transport".to_string(), "TRACE".to_string());

        let builder = LoggingBuilder::from_config(&config);

        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.with_target);
        assert!(builder.with_thread_ids);
        assert!(builder.with_file && builder.with_line_number);
        assert!(!builder.quiet_dependencies);
        assert_eq!(builder.span_events.to_fmt_span(), fmt::format::FmtSpan::CLOSE);
        assert_eq!(builder.directives, vec!["tidegram_transport=trace"]);
    }

    #[test]
    fn test_dependency_caps_precede_user_directives() {
        let builder = LoggingBuilder::new().directive("hyper=debug");
        assert_eq!(
            builder.effective_directives(false),
            vec!["hyper=warn", "hyper_util=warn", "h2=warn", "reqwest=warn", "hyper=debug"]
        );
        // RUST_LOG owns dependency levels
        assert_eq!(builder.effective_directives(true), vec!["hyper=debug"]);
        assert_eq!(
            LoggingBuilder::new()
                .quiet_dependencies(false)
                .effective_directives(false),
            Vec::<&str>::new()
        );
    }

    #[test]
    fn test_trace_dispatch_preset() {
        let builder = LoggingBuilder::new().trace_dispatch();
        assert_eq!(builder.directives, vec!["tidegram_framework=trace"]);
        assert_eq!(builder.span_events, SpanEvents::LIFECYCLE);
    }

    #[test]
    fn test_redacting_writer_masks_secrets() {
        let buffer = Buffer::default();
        let make = redacting(&buffer, &["123:SECRET", "hook-secret"]);

        make.make_writer()
            .write_all(b"POST https://api.telegram.org/bot123:SECRET/getMe secret=hook-secret\n")
            .unwrap();
        make.make_writer().write_all(b"plain line\n").unwrap();

        assert_eq!(
            buffer.contents(),
            "POST https://api.telegram.org/bot[redacted]/getMe secret=[redacted]\nplain line\n"
        );
    }

    #[test]
    fn test_redaction_through_subscriber() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(redacting(&buffer, &["123:SECRET"]))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(url = "https://api.telegram.org/bot123:SECRET/getMe", "request");
        });

        let output = buffer.contents();
        assert!(output.contains("bot[redacted]/getMe"));
        assert!(!output.contains("SECRET"));
    }

    #[test]
    fn test_empty_secret_is_ignored() {
        let builder = LoggingBuilder::new().redact("").redact("tok");
        assert_eq!(builder.secrets, vec!["tok"]);
    }

    #[test]
    fn test_second_init_fails() {
        let _ = LoggingBuilder::new().output(LogOutput::Stderr).try_init();
        assert!(LoggingBuilder::new().try_init().is_err());
    }
}
