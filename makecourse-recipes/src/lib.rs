//! Concrete build recipes: how each unit type turns into documents.
//!
//! The core crate orchestrates staleness, staging and destination copies;
//! the recipes here only render templates and drive `pdflatex` inside the
//! staging directory handed to them.

mod lecture;
mod registry;
mod sheet;
mod support;

pub use lecture::Lecture;
pub use registry::registry_from_config;
pub use sheet::Sheet;
