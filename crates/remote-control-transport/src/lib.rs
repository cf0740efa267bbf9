//! HTTP transport for the remote-control vendor API.
//!
//! Provides:
//! - `Credentials` - Basic-auth credential value
//! - `ClientConfig` - Per-client endpoint, auth and TLS policy
//! - Wire protocol (positional JSON arrays + error envelope)
//! - `ControlClient` - `SessionApi` implementation, session CRUD calls and user creation

pub mod client;
pub mod config;
pub mod credentials;
pub mod protocol;
pub mod sessions;

pub use client::ControlClient;
pub use config::{ClientConfig, ConfigError, TlsVersion};
pub use credentials::Credentials;
pub use sessions::NewUser;

#[cfg(test)]
mod test_support;
