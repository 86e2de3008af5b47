//! Configuration loading and validation.
//!
//! ```toml
//! [tama]
//! prefix = "!"
//!
//! [server.rizon]
//! host = "irc.rizon.net"
//! port = "+6697"          # leading '+' selects TLS
//! nick = "tama"
//! user = "tama"
//! realname = "Tama bot"
//! channels = ["#tama"]
//!
//! [server.rizon.service_auth]
//! password = "hunter2"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no [server.*] blocks configured")]
    NoServers,
    #[error("server {server:?}: {field} must not be empty")]
    EmptyField { server: String, field: &'static str },
    #[error("command prefix must not be empty")]
    EmptyPrefix,
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot-wide settings.
    #[serde(default)]
    pub tama: BotConfig,
    /// Servers to connect to, keyed by connection name.
    #[serde(default)]
    pub server: BTreeMap<String, ServerConfig>,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Fortune plugin configuration. The plugin is disabled without it.
    pub fortune: Option<FortuneConfig>,
}

/// Bot-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Command prefix, e.g. `!`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Permission tag to the user masks (`nick!user@host`, `*`/`?` wildcards)
    /// allowed to run actions carrying that tag.
    #[serde(default)]
    pub permissions: HashMap<String, Vec<String>>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            permissions: HashMap::new(),
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

/// One server connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Connection name; filled in from the `[server.<name>]` key.
    #[serde(skip)]
    pub name: String,
    /// Hostname.
    pub host: String,
    /// Port and TLS flag, written as `"6667"` or `"+6697"`.
    pub port: Port,
    /// Nickname to register with.
    pub nick: String,
    /// Username (ident).
    pub user: String,
    /// Real name; defaults to the nick.
    #[serde(default)]
    pub realname: Option<String>,
    /// Channels joined once registration completes.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Services identification sent once registration completes.
    pub service_auth: Option<ServiceAuth>,
}

impl ServerConfig {
    /// Real name, falling back to the nick.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nick)
    }
}

/// A port number plus the TLS flag encoded by a leading `+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PortSpec")]
pub struct Port {
    pub number: u16,
    pub tls: bool,
}

/// Raw port as written in TOML: a string or a bare integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortSpec {
    Text(String),
    Number(u16),
}

impl TryFrom<PortSpec> for Port {
    type Error = String;

    fn try_from(spec: PortSpec) -> Result<Self, Self::Error> {
        match spec {
            PortSpec::Number(number) => Ok(Self { number, tls: false }),
            PortSpec::Text(text) => text.parse(),
        }
    }
}

impl std::str::FromStr for Port {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (tls, digits) = match s.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let number: u16 = digits
            .parse()
            .map_err(|_| format!("invalid port {:?}", s))?;
        if number == 0 {
            return Err(format!("invalid port {:?}", s));
        }
        Ok(Self { number, tls })
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tls {
            write!(f, "+{}", self.number)
        } else {
            write!(f, "{}", self.number)
        }
    }
}

/// Services identification, sent as
/// `PRIVMSG <service> :<command> [username] <password>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAuth {
    /// Target service. Defaults to `NickServ`.
    pub service: Option<String>,
    /// Command verb. Defaults to `IDENTIFY`.
    pub command: Option<String>,
    /// Account name, for services that take one.
    pub username: Option<String>,
    /// Account password.
    pub password: String,
}

impl ServiceAuth {
    /// The service to message.
    pub fn service(&self) -> &str {
        self.service.as_deref().unwrap_or("NickServ")
    }

    /// The text of the identification message.
    pub fn command_text(&self) -> String {
        let command = self.command.as_deref().unwrap_or("IDENTIFY");
        match self.username {
            Some(ref username) => format!("{} {} {}", command, username, self.password),
            None => format!("{} {}", command, self.password),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Log every raw protocol line.
    #[serde(default)]
    pub raw: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            raw: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Fortune plugin configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FortuneConfig {
    /// Directories holding strfile-indexed fortune databases.
    pub paths: Vec<PathBuf>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Server configurations in name order, shareable across reconnects.
    pub fn servers(&self) -> Vec<Arc<ServerConfig>> {
        self.server.values().cloned().map(Arc::new).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tama.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.server.is_empty() {
            return Err(ConfigError::NoServers);
        }

        for (name, server) in &self.server {
            let required = [
                ("host", server.host.as_str()),
                ("nick", server.nick.as_str()),
                ("user", server.user.as_str()),
            ];
            for (field, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::EmptyField {
                        server: name.clone(),
                        field,
                    });
                }
            }
            if let Some(ref auth) = server.service_auth
                && auth.password.is_empty()
            {
                return Err(ConfigError::EmptyField {
                    server: name.clone(),
                    field: "service_auth.password",
                });
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::from_str(s)?;
        for (name, server) in config.server.iter_mut() {
            server.name = name.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [server.local]
        host = "127.0.0.1"
        port = "6667"
        nick = "tama"
        user = "tama"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = MINIMAL.parse().unwrap();
        assert_eq!(config.tama.prefix, "!");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.fortune.is_none());

        let server = &config.server["local"];
        assert_eq!(server.name, "local");
        assert_eq!(server.port, Port { number: 6667, tls: false });
        assert_eq!(server.realname(), "tama");
        assert!(server.channels.is_empty());
    }

    #[test]
    fn plus_port_enables_tls() {
        let port: Port = "+6697".parse().unwrap();
        assert!(port.tls);
        assert_eq!(port.number, 6697);
        assert_eq!(port.to_string(), "+6697");
    }

    #[test]
    fn integer_port_is_accepted() {
        let config: Config = MINIMAL.replace("\"6667\"", "6667").parse().unwrap();
        assert_eq!(config.server["local"].port.number, 6667);
    }

    #[test]
    fn bad_port_is_rejected() {
        for bad in ["\"+\"", "\"70000\"", "\"abc\"", "\"0\""] {
            let text = MINIMAL.replace("\"6667\"", bad);
            let err = text.parse::<Config>().unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let text = MINIMAL.replace("nick = \"tama\"", "");
        assert!(matches!(
            text.parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_nick_is_rejected() {
        let text = MINIMAL.replace("nick = \"tama\"", "nick = \"\"");
        assert!(matches!(
            text.parse::<Config>(),
            Err(ConfigError::EmptyField { field: "nick", .. })
        ));
    }

    #[test]
    fn no_servers_is_rejected() {
        assert!(matches!(
            "[tama]\nprefix = \".\"".parse::<Config>(),
            Err(ConfigError::NoServers)
        ));
    }

    #[test]
    fn service_auth_text() {
        let text = format!(
            "{MINIMAL}\n[server.local.service_auth]\nusername = \"tama\"\npassword = \"pw\"\n"
        );
        let config: Config = text.parse().unwrap();
        let auth = config.server["local"].service_auth.as_ref().unwrap();
        assert_eq!(auth.service(), "NickServ");
        assert_eq!(auth.command_text(), "IDENTIFY tama pw");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[tama]\nprefix = \".\"\n\n[logging]\nformat = \"json\"\nraw = true\n{MINIMAL}"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tama.prefix, ".");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.logging.raw);
        assert_eq!(config.servers().len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Config::load("/nonexistent/tama.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
