//! Notation conversion through pandoc.

use std::io::Write;
use std::process::{Command, Stdio};

use makecourse_core::{BuildError, NotationConverter};

/// Converts strings between markup dialects by piping them through the
/// `pandoc` binary. The conversion is only invoked when the source and
/// target notations actually differ, so most builds never spawn it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PandocConverter;

impl PandocConverter {
    pub fn new() -> Self {
        PandocConverter
    }
}

impl NotationConverter for PandocConverter {
    fn convert(&self, text: &str, from: &str, to: &str) -> Result<String, BuildError> {
        let notation_err = |message: String| BuildError::Notation {
            notation: to.to_string(),
            message,
        };

        tracing::debug!(from, to, "converting notation with pandoc");
        let mut child = Command::new("pandoc")
            .args(["-f", from, "-t", to])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    notation_err("pandoc is not installed".into())
                } else {
                    notation_err(e.to_string())
                }
            })?;

        // stdin is piped above, so the handle is present
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| notation_err(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| notation_err(e.to_string()))?;
        if !output.status.success() {
            return Err(notation_err(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let converted = String::from_utf8_lossy(&output.stdout).into_owned();
        // pandoc terminates its output with a newline the source never had
        Ok(converted.trim_end_matches('\n').to_string())
    }
}
