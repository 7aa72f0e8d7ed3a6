//! Error taxonomy for the build engine.
//!
//! Every domain failure surfaces as a [`BuildError`] so the orchestrator and
//! the CLI deal with exactly one error type. Lower-level filesystem, XML and
//! subprocess failures are wrapped rather than leaked to callers.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum BuildError {
    /// The import path scheme for a tag cannot be expanded with the
    /// attributes available on the importing node.
    #[error("import '{specifier}' on <{tag}> does not fit the scheme '{scheme}' (undefined placeholder '{placeholder}')")]
    ImportPathConfig {
        tag: String,
        specifier: String,
        scheme: String,
        placeholder: String,
    },

    /// Zero or more than one file matched an import specifier.
    #[error("cannot import '{path}' for <{tag}>: no unique match on disk (import scheme '{scheme}')")]
    ImportNotFound {
        tag: String,
        path: String,
        scheme: String,
    },

    /// An imported structural file parsed to nothing usable.
    #[error("imported file {path} is not valid")]
    ImportMalformed { path: PathBuf },

    /// An external build step exited with a non-zero status.
    #[error("command '{command}' failed (exit code {code})\n{tail}")]
    RecipeExecution {
        command: String,
        code: i32,
        tail: String,
    },

    /// A string cannot be converted to the requested notation.
    #[error("cannot convert to '{notation}': {message}")]
    Notation { notation: String, message: String },

    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The course document itself is not well-formed XML.
    #[error("XML error in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
