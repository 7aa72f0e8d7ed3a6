//! Lecture recipe: beamer slides, a handout, and a widescreen screencast
//! variant from the same template.

use makecourse_core::{BuildError, BuildOptions, Cmd, NodeView, Recipe, Stage};

use crate::support::{render_to_file, template_vars, LATEX};

#[derive(Debug, Default, Clone, Copy)]
pub struct Lecture;

impl Lecture {
    fn typeset(
        &self,
        unit: NodeView<'_>,
        stage: &Stage<'_>,
        opts: &BuildOptions,
        template: &str,
        tex_name: &str,
        extra: &[(&str, String)],
    ) -> Result<(), BuildError> {
        let vars = template_vars(unit, stage, template, Some(LATEX), extra)?;
        render_to_file(stage, template, tex_name, &vars)?;
        Cmd::new("pdflatex", stage.dir)
            .arg(tex_name)
            .passes(if opts.quick { 1 } else { 2 })
            .run()
    }
}

impl Recipe for Lecture {
    fn build(
        &self,
        unit: NodeView<'_>,
        stage: &Stage<'_>,
        opts: &BuildOptions,
    ) -> Result<(), BuildError> {
        let template = format!("{}.tex", unit.type_name());
        let name = unit.name();

        tracing::info!(unit = name, "building slides");
        self.typeset(
            unit,
            stage,
            opts,
            &template,
            &format!("{name}.tex"),
            &[("documentclass", r"\documentclass{beamer}".to_string())],
        )?;
        if opts.quick {
            return Ok(());
        }

        tracing::info!(unit = name, "building handout");
        self.typeset(
            unit,
            stage,
            opts,
            &template,
            &format!("{name}-handout.tex"),
            &[("documentclass", r"\documentclass[handout]{beamer}".to_string())],
        )?;

        tracing::info!(unit = name, "building widescreen screencast");
        let screencast = format!("{}-screencast.tex", unit.type_name());
        self.typeset(
            unit,
            stage,
            opts,
            &screencast,
            &format!("{name}-screencast.tex"),
            &[],
        )
    }

    fn output_files(&self, unit: NodeView<'_>, opts: &BuildOptions) -> Vec<String> {
        let name = unit.name();
        if opts.quick {
            vec![format!("{name}.pdf")]
        } else {
            vec![
                format!("{name}.pdf"),
                format!("{name}-handout.pdf"),
                format!("{name}-screencast.pdf"),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::testing::tree;

    #[test]
    fn declares_all_three_documents() {
        let (tree, worklist) = tree("<Course><CM name='intro'/></Course>");
        let files = Lecture.output_files(tree.view(worklist[0]), &BuildOptions::default());
        assert_eq!(
            files,
            vec!["intro.pdf", "intro-handout.pdf", "intro-screencast.pdf"]
        );
    }

    #[test]
    fn quick_builds_only_the_slides() {
        let (tree, worklist) = tree("<Course><CM name='intro'/></Course>");
        let opts = BuildOptions {
            quick: true,
            ..Default::default()
        };
        let files = Lecture.output_files(tree.view(worklist[0]), &opts);
        assert_eq!(files, vec!["intro.pdf"]);
    }
}
