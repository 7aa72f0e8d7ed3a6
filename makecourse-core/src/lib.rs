//! # makecourse-core
//!
//! Core build engine for makecourse: construction of the content tree from
//! the XML course description, import resolution with fuzzy path matching,
//! attribute inheritance, and the incremental-rebuild machinery (content
//! fingerprints, staleness oracle, build orchestrator).

pub mod builder;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod import;
pub mod notation;
pub mod process;
pub mod recipe;
pub mod stale;
pub mod tree;

pub use builder::{BuildReport, CourseBuilder};
pub use config::{Config, ConfigError};
pub use context::BuildContext;
pub use error::BuildError;
pub use fingerprint::{fingerprint, Fingerprint, FingerprintCache};
pub use notation::{IdentityConverter, LangString, NotationConverter};
pub use process::Cmd;
pub use recipe::{BuildOptions, Recipe, RecipeRegistry, Renderer, Stage};
pub use tree::{ContentNode, NodeId, NodeView, Tree, Unit};
