//! Build orchestration: drives one end-to-end run.
//!
//! Load the course document, construct the content tree (which resolves
//! imports and collects the worklist), compare fingerprints against the
//! previous run, then for each selected unit consult the staleness oracle,
//! stage a working directory, delegate to the unit's recipe and collect
//! the produced files. A failing unit is reported and the run continues
//! with the remainder; the fresh fingerprint cache is persisted either way.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::context::BuildContext;
use crate::document;
use crate::error::BuildError;
use crate::fingerprint::{fingerprint, FingerprintCache};
use crate::notation::NotationConverter;
use crate::recipe::{self, BuildOptions, RecipeRegistry, Renderer, Stage};
use crate::stale;
use crate::tree::{NodeView, Tree};

/// Outcome of one run, per unit.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub built: Vec<String>,
    pub skipped: Vec<String>,
    /// Units whose recipe failed, with the rendered error.
    pub failed: Vec<(String, String)>,
}

impl BuildReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Main course builder.
pub struct CourseBuilder<'a> {
    config: &'a Config,
    registry: &'a RecipeRegistry,
    renderer: &'a dyn Renderer,
    converter: &'a dyn NotationConverter,
}

impl<'a> CourseBuilder<'a> {
    pub fn new(
        config: &'a Config,
        registry: &'a RecipeRegistry,
        renderer: &'a dyn Renderer,
        converter: &'a dyn NotationConverter,
    ) -> Self {
        CourseBuilder {
            config,
            registry,
            renderer,
            converter,
        }
    }

    /// Run one build. `targets` selects units by name or type (`all` or an
    /// empty list selects everything).
    pub fn run(
        &self,
        targets: &[String],
        opts: &BuildOptions,
    ) -> Result<BuildReport, BuildError> {
        let course_file = self.config.course_file();
        tracing::info!(course = %course_file.display(), "building course");

        // debug staging directories are recreated from scratch each run
        if opts.debug {
            let debug_dir = self.config.base_dir().join("debug");
            if debug_dir.exists() {
                fs::remove_dir_all(&debug_dir)?;
            }
        }

        let root = document::parse_file(&course_file)?;
        let mut ctx = BuildContext::new(self.config, self.registry);
        let mut tree = Tree::build(root, &mut ctx)?;
        let worklist = ctx.into_worklist();
        tracing::info!("found {} buildable units", worklist.len());

        // Compare against the previous run and prepare the fresh cache,
        // covering every candidate whether or not it gets rebuilt.
        let cache_path = FingerprintCache::path_for(&course_file);
        let previous = FingerprintCache::load(&cache_path);
        let mut fresh = FingerprintCache::default();
        for &id in &worklist {
            let fp = fingerprint(tree.node(id).attrs());
            let name = tree.view(id).name().to_string();
            if previous.matches(&name, &fp) {
                if let Some(unit) = tree.node_mut(id).unit.as_mut() {
                    unit.remains_unchanged = true;
                }
            }
            fresh.insert(&name, &fp);
        }

        let mut report = BuildReport::default();
        for &id in &worklist {
            let unit = tree.view(id);
            if !selected(unit, targets) {
                continue;
            }
            let name = unit.name().to_string();
            match self.process_unit(unit, opts) {
                Ok(true) => report.built.push(name),
                Ok(false) => {
                    tracing::info!(unit = %name, "nothing changed, skipped");
                    report.skipped.push(name);
                }
                Err(err) => {
                    tracing::error!(unit = %name, error = %err, "unit build failed");
                    report.failed.push((name, err.to_string()));
                }
            }
        }

        if report.built.is_empty() && report.failed.is_empty() {
            tracing::info!("nothing has changed, nothing to do");
        }

        fresh.store(&cache_path)?;
        Ok(report)
    }

    /// Build one unit if it is stale. Returns whether anything was built.
    fn process_unit(&self, unit: NodeView<'_>, opts: &BuildOptions) -> Result<bool, BuildError> {
        let Some(recipe) = self.registry.recipe(unit.type_name()) else {
            return Ok(false);
        };

        let vars = unit.string_vars();
        let dest = recipe::destination_dir(&self.config.base_dir(), &self.config.output, &vars)?;
        let outputs = recipe.output_files(unit, opts);
        let out_paths: Vec<PathBuf> = outputs.iter().map(|f| dest.join(f)).collect();
        let out_refs: Vec<&Path> = out_paths.iter().map(PathBuf::as_path).collect();
        // imported paths are recorded relative to the base directory
        let base = self.config.base_dir();
        let source_dirs: Vec<PathBuf> = unit
            .imported_dirs()
            .into_iter()
            .map(|d| base.join(d))
            .collect();
        let dir_refs: Vec<&Path> = source_dirs.iter().map(PathBuf::as_path).collect();

        if !opts.force && !stale::should_rebuild(unit.remains_unchanged(), &out_refs, &dir_refs) {
            return Ok(false);
        }

        tracing::info!(unit = %unit.name(), "making unit");

        let (stage_dir, _cleanup) = self.stage_dir(unit.name(), opts)?;
        self.stage_resources(unit, &stage_dir)?;

        let stage = Stage {
            dir: &stage_dir,
            renderer: self.renderer,
            converter: self.converter,
            render_content: self.config.render_content,
        };
        recipe.build(unit, &stage, opts)?;

        fs::create_dir_all(&dest)?;
        for file in &outputs {
            let produced = stage_dir.join(file);
            if produced.exists() {
                fs::copy(&produced, dest.join(file))?;
            } else {
                tracing::warn!(unit = %unit.name(), file = %file, "declared output was not produced");
            }
        }
        Ok(true)
    }

    /// A fresh working area: a temporary directory cleaned up on drop, or a
    /// retained `debug/<name>/` directory with `--debug`.
    fn stage_dir(
        &self,
        name: &str,
        opts: &BuildOptions,
    ) -> Result<(PathBuf, Option<tempfile::TempDir>), BuildError> {
        if opts.debug {
            let dir = self.config.base_dir().join("debug").join(name);
            fs::create_dir_all(&dir)?;
            Ok((dir, None))
        } else {
            let tmp = tempfile::tempdir()?;
            let dir = tmp.path().to_path_buf();
            Ok((dir, Some(tmp)))
        }
    }

    /// Copy the unit type's resources (templates, style files) and the
    /// directories of everything it imported into the staging area.
    fn stage_resources(&self, unit: NodeView<'_>, stage_dir: &Path) -> Result<(), BuildError> {
        let resources = self.config.resource_dir(unit.type_name())?;
        copy_dir_contents(&resources, stage_dir)?;
        let base = self.config.base_dir();
        for source in unit.imported_dirs() {
            copy_dir_contents(&base.join(source), stage_dir)?;
        }
        Ok(())
    }
}

fn selected(unit: NodeView<'_>, targets: &[String]) -> bool {
    targets.is_empty()
        || targets
            .iter()
            .any(|t| t == "all" || t == unit.name() || t == unit.type_name())
}

fn copy_dir_contents(src: &Path, dest: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
