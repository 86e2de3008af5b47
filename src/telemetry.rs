//! Logging setup and span constructors.
//!
//! Two targets carry traffic rather than diagnostics: [`RAW_TARGET`] logs
//! every protocol line (`>>` inbound, `<<` outbound) at debug level, and
//! [`CHAT_TARGET`] logs what the bot says in channels.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Target for raw protocol lines.
pub const RAW_TARGET: &str = "tama::raw";

/// Target for chat lines spoken by the bot.
pub const CHAT_TARGET: &str = "tama::chat";

/// Build the filter: `RUST_LOG` if set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.raw {
        match format!("{}=debug", RAW_TARGET).parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    } else {
        filter
    }
}

/// Install the global subscriber.
///
/// Returns an error if one is already installed, which happens when the
/// bot reloads inside the same process.
pub fn init(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().finish().try_init(),
        LogFormat::Pretty => builder.finish().try_init(),
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for one server connection.
    pub fn connection(server: &str, host: &str) -> Span {
        info_span!("connection", server = %server, host = %host)
    }

    /// Create a span for an action invocation.
    pub fn action(name: &str, sender: &str, channel: &str) -> Span {
        info_span!("action", name = %name, sender = %sender, channel = %channel)
    }
}
