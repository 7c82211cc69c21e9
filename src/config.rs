//! Configuration loaded from a TOML file and the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::consts;

/// The prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "BWMXMD_";

/// The complete bot configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// External client configuration
    #[serde(default)]
    pub client: ClientConfig,
    /// Session credential storage
    #[serde(default)]
    pub auth: AuthConfig,
    /// Restart policy after a non-logout disconnect
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// IRC network configuration
    #[serde(default)]
    pub irc: IrcConfig,
    /// Tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,
}

impl Config {
    /// Loads the configuration from the defaults, the TOML file at `path` (if it exists) and
    /// finally any `BWMXMD_`-prefixed environment variables, in that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the merged values do not make up a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::figment(path).extract().map_err(Error::from)
    }

    /// Returns the layered configuration sources.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// The identity the external client announces itself with, as a `[name, platform, version]`
/// triple.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientIdentity(pub String, pub String, pub String);

impl ClientIdentity {
    /// The client name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// The platform the client claims to run on.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.1
    }

    /// The client version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.2
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        let [name, platform, version] = consts::DEFAULT_CLIENT_IDENTITY;

        ClientIdentity(name.into(), platform.into(), version.into())
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) {}", self.0, self.1, self.2)
    }
}

/// Verbosity of the external client library's own logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No output at all.
    #[default]
    Silent,
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages.
    Info,
    /// Debug messages.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the level as an `EnvFilter` directive value.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration of the external chat client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// The client-identity triple.
    #[serde(default)]
    pub identity: ClientIdentity,
    /// Log verbosity of the external client library.
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where session credentials are persisted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// The folder persisted credentials are stored in.
    pub folder: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            folder: PathBuf::from(consts::DEFAULT_AUTH_FOLDER),
        }
    }
}

/// Restart policy configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconnectConfig {
    /// How to wait before restarting a session.
    #[serde(default)]
    pub strategy: ReconnectStrategy,
}

/// How long to wait before restarting a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ReconnectStrategy {
    /// Restart right away, without limit.
    #[default]
    Immediate,
    /// Restart after an exponentially increasing delay.
    Backoff {
        /// The delay before the first restart.
        #[serde(default = "default_backoff_initial", with = "humantime_serde")]
        initial: Duration,
        /// The upper bound for the delay.
        #[serde(default = "default_backoff_max", with = "humantime_serde")]
        max: Duration,
        /// Randomize each delay between zero and the computed value.
        #[serde(default)]
        jitter: bool,
    },
}

/// Output format of the stdout log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One JSON object per line.
    Json,
    /// Multi-line, human readable output.
    Pretty,
    /// Single-line, human readable output.
    #[default]
    Compact,
}

/// Tracing configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TracingConfig {
    /// Enable OTLP export
    #[serde(default)]
    pub enabled: bool,
    /// Format of the stdout log output
    #[serde(default)]
    pub format: Format,
}

/// Configuration of a single IRC channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IrcChannelConfig {
    /// The shared key to access the channel.
    pub key: Option<String>,
}

/// TLS settings of the IRC connection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IrcTlsConfig {
    /// Enable TLS.
    pub enabled: bool,
}

/// IRC network configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IrcConfig {
    /// The client's nickname.
    pub nickname: String,
    /// Alternative nicknames for the client, if the default is taken.
    #[serde(default)]
    pub alt_nicks: Vec<String>,
    /// The client's username.
    pub username: Option<String>,
    /// The client's real name.
    pub realname: Option<String>,
    /// The hostname of the server to connect to.
    pub hostname: String,
    /// The password to connect to the server.
    pub password: Option<String>,
    /// The port number of the server to connect to.
    pub port: Option<u16>,
    /// TLS configuration.
    pub tls: Option<IrcTlsConfig>,
    /// List of channels to automatically join.
    #[serde(default)]
    pub channels: HashMap<String, Option<IrcChannelConfig>>,
}

impl Default for IrcConfig {
    fn default() -> Self {
        IrcConfig {
            nickname: String::from("bwmxmd"),
            alt_nicks: vec![],
            username: None,
            realname: None,
            hostname: String::from("localhost"),
            password: None,
            port: None,
            tls: None,
            channels: HashMap::new(),
        }
    }
}

impl IrcConfig {
    /// Returns the configured port, or the standard port for the TLS setting.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.fallback_port())
    }

    /// Return the port number to use based on whether the connection requires TLS or not.
    fn fallback_port(&self) -> u16 {
        if self.tls.as_ref().map(|tls| tls.enabled) == Some(true) {
            6697
        } else {
            6667
        }
    }
}

/// The default delay before the first restart with backoff.
#[must_use]
pub const fn default_backoff_initial() -> Duration {
    consts::DEFAULT_BACKOFF_INITIAL
}

/// The default upper bound for the backoff delay.
#[must_use]
pub const fn default_backoff_max() -> Duration {
    consts::DEFAULT_BACKOFF_MAX
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = Config::load("missing.toml").expect("defaults should extract");

            assert_eq!(config.client.log_level, LogLevel::Silent);
            assert_eq!(config.client.identity.name(), "Bwmxmd Quantum");
            assert_eq!(config.client.identity.platform(), "Safari");
            assert_eq!(config.client.identity.version(), "1.0");
            assert_eq!(config.auth.folder, PathBuf::from("bwmxmd_auth_info"));
            assert_eq!(config.reconnect.strategy, ReconnectStrategy::Immediate);

            Ok(())
        });
    }

    #[test]
    fn file_and_env_are_layered() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [auth]
                folder = "sessions/main"

                [irc]
                nickname = "quantum"
                hostname = "irc.example.com"
                tls = { enabled = true }

                [reconnect.strategy]
                kind = "backoff"
                initial = "2s"
                max = "1m"
                jitter = true
                "#,
            )?;
            jail.set_env("BWMXMD_IRC__NICKNAME", "override");

            let config: Config = Config::figment("config.toml").extract()?;

            assert_eq!(config.auth.folder, PathBuf::from("sessions/main"));
            assert_eq!(config.irc.nickname, "override");
            assert_eq!(config.irc.port(), 6697);
            assert_eq!(
                config.reconnect.strategy,
                ReconnectStrategy::Backoff {
                    initial: Duration::from_secs(2),
                    max: Duration::from_secs(60),
                    jitter: true,
                }
            );

            Ok(())
        });
    }

    #[test]
    fn plain_port_fallback() {
        let config = IrcConfig::default();

        assert_eq!(config.port(), 6667);
    }

    #[test]
    fn silent_log_level_disables_output() {
        assert_eq!(LogLevel::Silent.as_directive(), "off");
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
    }
}
