//! HTTP host for the contact-form intake handler.
//!
//! Wires [`contact_intake_core::Intake`] to a `tiny_http` listener. The
//! binary (`contact-intake`) adds config loading and logging on top.

pub mod config;
pub mod form;
pub mod server;

pub use config::Cli;
pub use config::ConfigError;
pub use config::ServerConfig;
pub use server::IntakeServer;
pub use server::ServeError;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
