//! Running the external command-line tools (tesseract, yt-dlp).

use std::ffi::OsStr;
use std::io;
use std::process::{Command, Output};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Run `program` with `args` and return its stdout as text.
/// A non-zero exit status is an error carrying the trimmed stderr.
pub fn run_capture<I, S>(program: &str, args: I) -> Result<String, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = run(program, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run `program` and only report whether it succeeded.
pub fn run_status<I, S>(program: &str, args: I) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run(program, args).map(|_| ())
}

fn run<I, S>(program: &str, args: I) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!("running {:?}", command);

    let output = command.output().map_err(|source| ToolError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(ToolError::Failed {
            program: program.to_string(),
            status: output
                .status
                .code()
                .map(|c| format!("status {}", c))
                .unwrap_or_else(|| "a signal".to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
