//! EVNEX client library
//!
//! Typed, authenticated access to the EVNEX charge point cloud API.
//!
//! # Public API
//!
//! The primary public API is [`client::EvnexClient`]. It signs in through
//! [`auth::CredentialStore`], sends every request through the retrying
//! [`executor::Executor`] and decodes payloads into `evnex_core` records.
//! Configuration lives in [`config::EvnexConfig`], with [`config::CliConfig`]
//! and [`config::ConfigBuilder`] layering file, environment and flags.
//!
//! ```no_run
//! use evnexctl::auth::Credentials;
//! use evnexctl::client::EvnexClient;
//! use evnexctl::config::EvnexConfig;
//!
//! # async fn example() -> evnex_core::Result<()> {
//! let client = EvnexClient::connect(
//!     EvnexConfig::default(),
//!     Credentials::new("jane@example.com", "secret"),
//! )
//! .await?;
//!
//! let user = client.get_user_detail().await?;
//! println!("Signed in as {}", user.name);
//! # Ok(())
//! # }
//! ```

/// Identity provider and token store.
pub mod auth;

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Typed EVNEX operations.
pub mod client;

/// Configuration types for the client and the CLI tool.
pub mod config;

/// Request execution with retries.
pub mod executor;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

/// Backoff policy.
pub mod retry;

// Mock EVNEX API used by unit and integration tests
#[doc(hidden)]
pub mod test_utils;
