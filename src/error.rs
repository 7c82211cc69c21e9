//! Error types

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Application errors for configuration, session state and client operations.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The configuration could not be extracted from its sources.
    #[error("Invalid configuration")]
    #[diagnostic(
        code(bwmxmd::config),
        help("check the config file and any BWMXMD_ environment variables")
    )]
    Config(#[source] Box<figment::Error>),
    /// The auth folder could not be created, read or written.
    #[error("Could not access auth state at {path}")]
    #[diagnostic(code(bwmxmd::auth_io))]
    AuthIo {
        /// The path that was being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The persisted credentials could not be (de)serialized.
    #[error("Could not decode or encode session credentials")]
    #[diagnostic(
        code(bwmxmd::credentials),
        help("delete the auth folder to start a fresh session")
    )]
    Credentials(#[source] serde_json::Error),
    /// The external client failed to set up a session.
    #[error("Could not create chat client")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The external client failed to deliver a message.
    #[error("Could not send message to {recipient}")]
    Send {
        /// The intended recipient.
        recipient: String,
        /// The reason the send failed.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// General IRC communication error.
    #[error("IRC error")]
    Irc(#[from] irc::error::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
