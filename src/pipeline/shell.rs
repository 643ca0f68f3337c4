//! External command execution
//!
//! Every collaborator (mysql, tabix, plink, gemini) is driven through
//! here: explicit argument vectors, no shell, exit status always
//! checked, stderr captured into the error.

use crate::core::ExternalToolFailure;
use std::ffi::OsStr;
use std::process::{Command, Output};

/// Longest stderr excerpt carried into an error
const STDERR_EXCERPT_LIMIT: usize = 2000;

/// Run an external program to completion, capturing its output
///
/// Non-zero exit becomes `ExternalToolFailure::Exited` with the tail of
/// the diagnostic stream attached; a spawn failure (missing binary)
/// becomes `ExternalToolFailure::Launch`.
pub fn run_tool<I, S>(program: &'static str, args: I) -> Result<Output, ExternalToolFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ExternalToolFailure::Launch { program, source })?;

    if !output.status.success() {
        return Err(ExternalToolFailure::Exited {
            program,
            status: output.status,
            stderr: diagnostic_excerpt(&output),
        });
    }

    Ok(output)
}

/// Whether a program can be launched at all
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn diagnostic_excerpt(output: &Output) -> String {
    let stream = if output.stderr.is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let text = String::from_utf8_lossy(stream);
    let text = text.trim();
    if text.len() > STDERR_EXCERPT_LIMIT {
        let mut start = text.len() - STDERR_EXCERPT_LIMIT;
        while !text.is_char_boundary(start) {
            start += 1;
        }
        format!("...{}", &text[start..])
    } else {
        text.to_string()
    }
}
