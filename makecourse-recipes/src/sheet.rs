//! Exercise-sheet recipe for tutorials and practicals: joins the unit's
//! exercise fragments into one LaTeX body and typesets a student and a
//! teacher variant.

use makecourse_core::{BuildError, BuildOptions, Cmd, NodeView, Recipe, Stage};

use crate::support::{render_to_file, template_vars, LATEX};

#[derive(Debug, Default, Clone, Copy)]
pub struct Sheet;

/// The LaTeX body of a sheet: each child `Exercice` rendered through the
/// exercise template, followed by the unit's own content.
fn sheet_body(unit: NodeView<'_>, stage: &Stage<'_>) -> Result<String, BuildError> {
    let mut parts = Vec::new();
    for exercice in unit.children_with_tag("Exercice") {
        let vars = template_vars(exercice, stage, "exo.tex", Some(LATEX), &[])?;
        parts.push(stage.renderer.render_file(stage.dir, "exo.tex", &vars)?);
    }
    let mut body = parts.join("\n");
    if let Some(own) = unit.content() {
        body.push_str(&own.convert_to(Some(LATEX), stage.converter)?);
    }
    Ok(body)
}

impl Sheet {
    fn typeset(
        &self,
        unit: NodeView<'_>,
        stage: &Stage<'_>,
        opts: &BuildOptions,
        tex_name: &str,
        teacher: &str,
        body: &str,
    ) -> Result<(), BuildError> {
        let template = format!("{}.tex", unit.type_name());
        let vars = template_vars(
            unit,
            stage,
            &template,
            Some(LATEX),
            &[
                ("Teacher", teacher.to_string()),
                ("Content", body.to_string()),
            ],
        )?;
        render_to_file(stage, &template, tex_name, &vars)?;
        Cmd::new("pdflatex", stage.dir)
            .arg(tex_name)
            .passes(if opts.quick { 1 } else { 2 })
            .run()
    }
}

impl Recipe for Sheet {
    fn build(
        &self,
        unit: NodeView<'_>,
        stage: &Stage<'_>,
        opts: &BuildOptions,
    ) -> Result<(), BuildError> {
        let name = unit.name();

        // refresh the shared style file when the resources carry one
        let style = format!("{}.sty", unit.type_name());
        if stage.dir.join(&style).is_file() {
            let vars = template_vars(unit, stage, &style, Some(LATEX), &[])?;
            render_to_file(stage, &style, &style, &vars)?;
        }

        let body = sheet_body(unit, stage)?;

        tracing::info!(unit = name, "building student version");
        self.typeset(unit, stage, opts, &format!("{name}-student.tex"), "", &body)?;
        if opts.quick {
            return Ok(());
        }

        tracing::info!(unit = name, "building teacher version");
        self.typeset(
            unit,
            stage,
            opts,
            &format!("{name}-teacher.tex"),
            "[teacher]",
            &body,
        )
    }

    fn output_files(&self, unit: NodeView<'_>, opts: &BuildOptions) -> Vec<String> {
        let name = unit.name();
        if opts.quick {
            vec![format!("{name}-student.pdf")]
        } else {
            vec![
                format!("{name}-student.pdf"),
                format!("{name}-teacher.pdf"),
            ]
        }
    }
}
