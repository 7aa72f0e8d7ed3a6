//! Shared plumbing for the concrete recipes: template contexts and
//! render-to-file.

use std::collections::BTreeMap;
use std::fs;

use makecourse_core::{BuildError, NodeView, Stage};

/// Target dialect of every LaTeX-producing recipe.
pub(crate) const LATEX: &str = "latex";

/// Template context for one node: its effective attributes converted to
/// the target dialect, overridden by `extra` (already in the target
/// dialect), plus `Filename` and `Date`. When content rendering is
/// enabled, the `Content` value is itself run through the template engine
/// before the document template sees it.
pub(crate) fn template_vars(
    node: NodeView<'_>,
    stage: &Stage<'_>,
    template: &str,
    target: Option<&str>,
    extra: &[(&str, String)],
) -> Result<BTreeMap<String, String>, BuildError> {
    let mut vars = BTreeMap::new();
    for (key, value) in node.attrs() {
        // overridden keys never reach the converter
        if extra.iter().any(|(k, _)| *k == key.as_str()) {
            continue;
        }
        vars.insert(key.clone(), value.convert_to(target, stage.converter)?);
    }
    for (key, value) in extra {
        vars.insert((*key).to_string(), value.clone());
    }
    vars.insert("Filename".to_string(), template.to_string());
    vars.insert(
        "Date".to_string(),
        chrono::Local::now().format("%d/%m/%Y - %H:%M").to_string(),
    );

    if stage.render_content {
        if let Some(content) = vars.get("Content").cloned() {
            let rendered = stage.renderer.render_str(&content, &vars)?;
            vars.insert("Content".to_string(), rendered);
        }
    }
    Ok(vars)
}

/// Render `template` from the staging directory and write the result into
/// the same directory under `out_name`.
pub(crate) fn render_to_file(
    stage: &Stage<'_>,
    template: &str,
    out_name: &str,
    vars: &BTreeMap<String, String>,
) -> Result<(), BuildError> {
    let rendered = stage.renderer.render_file(stage.dir, template, vars)?;
    fs::write(stage.dir.join(out_name), rendered)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use makecourse_core::document::parse_str;
    use makecourse_core::{
        BuildContext, Config, IdentityConverter, NodeId, RecipeRegistry, Stage, Tree,
    };
    use makecourse_render::TemplateRenderer;

    use crate::{Lecture, Sheet};

    pub(crate) const RENDERER: TemplateRenderer = TemplateRenderer;
    pub(crate) const CONVERTER: IdentityConverter = IdentityConverter;

    pub(crate) fn registry() -> RecipeRegistry {
        let mut registry = RecipeRegistry::new();
        registry.register("CM", Box::new(Lecture));
        registry.register("TP", Box::new(Sheet));
        registry.register_fragment("Exercice");
        registry
    }

    pub(crate) fn tree(xml: &str) -> (Tree, Vec<NodeId>) {
        let config = Config::default();
        let registry = registry();
        let mut ctx = BuildContext::new(&config, &registry);
        let root = parse_str(xml, Path::new("course.xml")).unwrap();
        let tree = Tree::build(root, &mut ctx).unwrap();
        let worklist = ctx.into_worklist();
        (tree, worklist)
    }

    pub(crate) fn stage<'a>(dir: &'a Path, render_content: bool) -> Stage<'a> {
        Stage {
            dir,
            renderer: &RENDERER,
            converter: &CONVERTER,
            render_content,
        }
    }
}
