//! Build recipes: the pluggable collaborators that know how to turn one
//! buildable unit into documents.
//!
//! Recipes are resolved at startup by explicit registration into a
//! [`RecipeRegistry`]; a tag registered without a recipe is a *fragment*
//! type (content reused by other units, never built on its own).

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::notation::NotationConverter;
use crate::tree::NodeView;

/// Options carried from the CLI into every unit build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Rebuild even when nothing changed.
    pub force: bool,
    /// Single typesetting pass, skip secondary document variants.
    pub quick: bool,
    /// Stage units under a retained `debug/` directory.
    pub debug: bool,
}

/// Template rendering seam, implemented by makecourse-render.
pub trait Renderer {
    /// Render the template file `name` located in `dir`.
    fn render_file(
        &self,
        dir: &Path,
        name: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, BuildError>;

    /// Render an inline template string.
    fn render_str(
        &self,
        source: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, BuildError>;
}

/// Everything a recipe needs while producing documents for one unit:
/// the staged working directory (resources already copied in) and the
/// rendering/conversion collaborators.
pub struct Stage<'a> {
    /// Absolute path of the staging directory.
    pub dir: &'a Path,
    pub renderer: &'a dyn Renderer,
    pub converter: &'a dyn NotationConverter,
    /// Whether the `Content` attribute is itself templated before the
    /// document template runs.
    pub render_content: bool,
}

/// A build recipe for one unit type.
pub trait Recipe {
    /// Produce the unit's documents inside the staging directory.
    fn build(
        &self,
        unit: NodeView<'_>,
        stage: &Stage<'_>,
        opts: &BuildOptions,
    ) -> Result<(), BuildError>;

    /// Relative names of the files `build` is expected to leave in the
    /// staging directory, in order.
    fn output_files(&self, unit: NodeView<'_>, opts: &BuildOptions) -> Vec<String>;
}

enum Entry {
    Recipe(Box<dyn Recipe>),
    Fragment,
}

/// Static tag-name -> recipe mapping, populated once at startup.
#[derive(Default)]
pub struct RecipeRegistry {
    entries: HashMap<String, Entry>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buildable unit type.
    pub fn register(&mut self, tag: impl Into<String>, recipe: Box<dyn Recipe>) {
        self.entries.insert(tag.into(), Entry::Recipe(recipe));
    }

    /// Register a fragment type: recognized in the tree (never absorbed as
    /// leaf text) but carrying no recipe, so never on the worklist.
    pub fn register_fragment(&mut self, tag: impl Into<String>) {
        self.entries.insert(tag.into(), Entry::Fragment);
    }

    /// Whether `tag` names a registered unit type (recipe or fragment).
    pub fn is_unit_type(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// The recipe for `tag`, if it has one.
    pub fn recipe(&self, tag: &str) -> Option<&dyn Recipe> {
        match self.entries.get(tag) {
            Some(Entry::Recipe(recipe)) => Some(recipe.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("RecipeRegistry").field("tags", &tags).finish()
    }
}

/// Expand the destination directory for a unit's produced files.
pub fn destination_dir(
    base: &Path,
    scheme: &str,
    vars: &BTreeMap<String, String>,
) -> Result<PathBuf, BuildError> {
    let expanded = crate::import::expand_scheme(scheme, vars).map_err(|placeholder| {
        crate::config::ConfigError::Scheme {
            scheme: scheme.to_string(),
            placeholder,
        }
    })?;
    Ok(base.join(expanded))
}
