//! Template rendering and notation conversion backends.
//!
//! The core crate defines the [`makecourse_core::Renderer`] and
//! [`makecourse_core::NotationConverter`] seams; this crate provides the
//! production implementations built on minijinja and pandoc.

mod convert;
mod template;

pub use convert::PandocConverter;
pub use template::TemplateRenderer;
