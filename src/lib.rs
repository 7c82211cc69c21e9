//! A chat bot that answers a small set of `!` commands.
//!
//! The bot drives sessions created by a [`Connector`], reacts to the events they produce and
//! restarts them when the connection drops for any reason other than a logout.

pub mod auth;
pub mod bot;
pub mod client;
pub mod command;
pub mod config;
pub mod consts;
mod error;
pub mod event;
pub mod handler;
pub mod message;
pub mod network;
pub mod pairing;
pub mod reconnect;
pub mod tracing;

pub use bot::{Bot, State};
pub use client::{Client, Connector, OutgoingMessage, Session};
pub use config::Config;
pub use error::Error;
pub use network::IrcConnector;
