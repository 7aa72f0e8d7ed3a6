//! minijinja-backed implementation of the core rendering seam.
//!
//! The default Jinja delimiters collide with braces attached to LaTeX
//! macros, so the environment uses `{%% %%}`, `{{< >}}` and `{%< >%}`
//! instead. Templates load from the unit's staging directory.

use std::collections::BTreeMap;
use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{path_loader, Environment, Value};

use makecourse_core::{BuildError, Renderer};

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        TemplateRenderer
    }

    fn environment(dir: Option<&Path>) -> Result<Environment<'static>, BuildError> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("{%%", "%%}")
            .variable_delimiters("{{<", ">}}")
            .comment_delimiters("{%<", ">%}")
            .build()
            .map_err(|e| BuildError::Template(e.to_string()))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        if let Some(dir) = dir {
            env.set_loader(path_loader(dir));
        }
        Ok(env)
    }
}

impl Renderer for TemplateRenderer {
    fn render_file(
        &self,
        dir: &Path,
        name: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, BuildError> {
        let env = Self::environment(Some(dir))?;
        let template = env
            .get_template(name)
            .map_err(|e| BuildError::Template(e.to_string()))?;
        report_unfilled(&template, vars, name);
        template
            .render(Value::from_serialize(vars))
            .map_err(|e| BuildError::Template(e.to_string()))
    }

    fn render_str(
        &self,
        source: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, BuildError> {
        let env = Self::environment(None)?;
        let template = env
            .template_from_str(source)
            .map_err(|e| BuildError::Template(e.to_string()))?;
        report_unfilled(&template, vars, "<inline>");
        template
            .render(Value::from_serialize(vars))
            .map_err(|e| BuildError::Template(e.to_string()))
    }
}

/// Log the variables a template references but the context does not fill.
/// Diagnostic only, rendering continues with empty values.
fn report_unfilled(
    template: &minijinja::Template<'_, '_>,
    vars: &BTreeMap<String, String>,
    name: &str,
) {
    let mut unfilled: Vec<String> = template
        .undeclared_variables(false)
        .into_iter()
        .filter(|v| !vars.contains_key(v))
        .collect();
    if !unfilled.is_empty() {
        unfilled.sort_unstable();
        tracing::debug!(
            template = name,
            "unfilled template variables: {}",
            unfilled.join(", ")
        );
    }
}
