//! Listener bootstrap for an SMTP server.
//!
//! [`create`] turns a [`ListenerConfig`] into a bound, optionally TLS-secured
//! [`ListenerHandle`]; [`close`] releases it. Protocol handling happens above
//! this crate, on the [`Connection`]s the handle accepts.

pub mod config;
pub mod listener;

pub use config::ListenerConfig;
pub use listener::{close, create, Connection, ListenerError, ListenerHandle};
