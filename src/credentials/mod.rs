//! Credential and script loading.
//!
//! # Responsibilities
//! - Turn a password file into an address → password map
//! - Read every configured Lua script into memory before serving
//!
//! # Design Decisions
//! - Any read or parse failure is fatal to startup; partial loads are never used
//! - An inline password makes the password file irrelevant; it is not read

pub mod password_file;
pub mod scripts;

use std::path::PathBuf;

use thiserror::Error;

pub use password_file::{load_password_map, CredentialSet};
pub use scripts::{load_scripts, split_script_list, ScriptBundle};

/// Errors raised while loading credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("error loading redis passwords from file {path:?}: {source}")]
    ReadPasswordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing redis password file {path:?}: {source}")]
    ParsePasswordFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("error loading script file {path:?}: {source}")]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
