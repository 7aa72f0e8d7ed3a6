//! Blocking external command execution for build recipes.
//!
//! Commands always run with an explicit working directory; the build never
//! changes the process-wide current directory. Exit status is checked on
//! every invocation and a failure carries the tail of the command's output
//! (typesetting errors show up in the last lines).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;

/// How many trailing output lines a failure report keeps.
const TAIL_LINES: usize = 10;

/// Builder for one external command invocation.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    dir: PathBuf,
    passes: u32,
}

impl Cmd {
    pub fn new(program: impl Into<String>, dir: &Path) -> Self {
        Cmd {
            program: program.into(),
            args: Vec::new(),
            dir: dir.to_path_buf(),
            passes: 1,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Repeat the command (multi-pass typesetting needs identical reruns).
    pub fn passes(mut self, passes: u32) -> Self {
        self.passes = passes.max(1);
        self
    }

    /// Run the command to completion, once per pass.
    pub fn run(self) -> Result<(), BuildError> {
        for pass in 1..=self.passes {
            tracing::debug!(
                command = %self.display(),
                dir = %self.dir.display(),
                pass,
                "run command"
            );

            let output = Command::new(&self.program)
                .args(&self.args)
                .current_dir(&self.dir)
                .output()
                .map_err(|err| match err.kind() {
                    std::io::ErrorKind::NotFound => BuildError::RecipeExecution {
                        command: self.display(),
                        code: -1,
                        tail: format!("'{}' is not installed or not in PATH", self.program),
                    },
                    _ => BuildError::Io(err),
                })?;

            let combined = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            tracing::trace!(command = %self.display(), output = %combined);

            if !output.status.success() {
                return Err(BuildError::RecipeExecution {
                    command: self.display(),
                    code: output.status.code().unwrap_or(-1),
                    tail: tail_of(&combined),
                });
            }
        }
        Ok(())
    }

    fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

fn tail_of(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_runs_all_passes() {
        let tmp = tempfile::tempdir().unwrap();
        Cmd::new("true", tmp.path()).passes(2).run().unwrap();
    }

    #[test]
    fn failing_command_reports_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Cmd::new("false", tmp.path()).run().unwrap_err();
        match err {
            BuildError::RecipeExecution { code, .. } => assert_ne!(code, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_classified() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Cmd::new("definitely-not-a-real-binary", tmp.path())
            .run()
            .unwrap_err();
        assert!(matches!(err, BuildError::RecipeExecution { .. }), "{err}");
    }

    #[test]
    fn tail_keeps_last_lines_only() {
        let output: String = (0..20).map(|i| format!("line{i}\n")).collect();
        let tail = tail_of(&output);
        assert!(tail.starts_with("line10"));
        assert!(tail.ends_with("line19"));
    }
}
