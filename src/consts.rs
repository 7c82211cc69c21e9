//! Constants shared across the bot.

use std::time::Duration;

/// The reply sent for `!hello`.
pub const GREETING: &str = "👋 Hello from Bwmxmd Quantum Edition!";

/// The reply sent for `!ping`.
pub const PONG: &str = "🏓 Pong!";

/// The label prepended to the remainder of an `!echo` command.
pub const ECHO_LABEL: &str = "Echoing: ";

/// The default name of the folder that holds persisted session credentials.
pub const DEFAULT_AUTH_FOLDER: &str = "bwmxmd_auth_info";

/// The name of the credentials file inside the auth folder.
pub const CREDENTIALS_FILE_NAME: &str = "creds.json";

/// The default client-identity triple announced to the network.
pub const DEFAULT_CLIENT_IDENTITY: [&str; 3] = ["Bwmxmd Quantum", "Safari", "1.0"];

/// The number of events a session may buffer before the connector has to wait for the runner.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The default initial delay when reconnecting with backoff.
pub const DEFAULT_BACKOFF_INITIAL: Duration = Duration::from_secs(1);

/// The default upper bound for the reconnect delay when reconnecting with backoff.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(60);
