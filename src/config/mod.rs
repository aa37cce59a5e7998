//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! startup arguments (cli.rs, explicit values only)
//!     + environment (loader.rs, Environment trait)
//!     + defaults (schema.rs, Default impls)
//!     → loader.rs (per-option precedence, lenient env parsing)
//!     → validation.rs (cross-field checks)
//!     → ExporterConfig (immutable, passed by reference)
//! ```
//!
//! # Design Decisions
//! - Config is built once; nothing downstream reads the environment
//! - Unparsable environment values fall back to defaults and are reported,
//!   never fatal
//! - The connection timeout is the one value whose parse failure is fatal

pub mod cli;
pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{resolve_config, ConfigError, EnvFallback, Environment, ProcessEnvironment};
pub use schema::{ClientTlsConfig, ExporterConfig, LogFormat, ServerTlsConfig, WebConfig};
