//! Subprocess invocation with captured output.

use std::process::{Command, Stdio};

use crate::error::SystemError;

/// Exit status and captured output of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub status: i32,
    /// Captured stdout with stderr appended.
    pub output: String,
}

impl CommandOutput {
    /// Returns `true` when the process exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a command to completion and captures its output.
///
/// The first element of `args` is the program, the rest its arguments.
/// stdin is closed; stdout and stderr are both captured and returned as one
/// string. Failure to spawn is an error; a non-zero exit is not.
pub fn get_status_output(args: &[String]) -> Result<CommandOutput, SystemError> {
    let (program, rest) = args.split_first().ok_or(SystemError::EmptyCommand)?;

    let out = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| SystemError::Spawn {
            program: program.clone(),
            source: e,
        })?;

    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&out.stderr));

    Ok(CommandOutput {
        status: out.status.code().unwrap_or(-1),
        output,
    })
}
