use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use crate::error::{Error, Result, Stage};

static DEPTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"depth=(\d+)").unwrap());

fn create_command(program: &str) -> Command {
    let mut command = Command::new(program);

    #[cfg(target_os = "windows")]
    const CREATE_NO_WINDOW: u32 = 0x08000000;
    #[cfg(target_os = "windows")]
    command.creation_flags(CREATE_NO_WINDOW);

    command
}

/// Runs `program` in `dir` and waits for it, mapping failures onto `stage`.
///
/// Returns the captured stdout of a successful run.
pub(crate) fn run<I, S>(stage: Stage, program: &str, args: I, dir: &Path) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = create_command(program);
    command.args(args).current_dir(dir);
    log::debug!("{stage}: running {command:?}");

    let output = command.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ToolNotFound {
            stage,
            program: program.to_string(),
        },
        _ => Error::Io { stage, source: e },
    })?;

    // latex writes its diagnostics to stdout, which may not be valid UTF-8
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(log);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !log.is_empty() {
            log.push('\n');
        }
        log.push_str(&stderr);
    }
    log::warn!("{stage}: {program} exited with {}", output.status);
    Err(Error::ToolFailed {
        stage,
        status: output.status,
        log,
    })
}

/// Baseline depth of the first page from the report `dvipng -depth` prints.
pub(crate) fn dvipng_depth(report: &str) -> Option<u32> {
    DEPTH.captures(report)?.get(1)?.as_str().parse().ok()
}

/// Checks that `program` can be found on `PATH` (or exists, if it is a path).
pub(crate) fn locate(stage: Stage, program: &str) -> Result<()> {
    match which::which(program) {
        Ok(path) => {
            log::debug!("{stage}: using {}", path.display());
            Ok(())
        }
        Err(_) => Err(Error::ToolNotFound {
            stage,
            program: program.to_string(),
        }),
    }
}
