//! Running shell commands as experiment trials.

use std::io;
use std::process::Command;

/// Status reported for a command killed by a signal.
pub const SIGNALED: i32 = -1;

/// Captured result of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, or [`SIGNALED`].
    pub status: i32,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the command exited with status zero.
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs `command` with `sh -c` and captures its output.
///
/// A non-zero exit is a normal output; only failing to start the shell is
/// an error.
pub fn run(command: &str) -> io::Result<CommandOutput> {
    let output = Command::new("sh").arg("-c").arg(command).output()?;

    Ok(CommandOutput {
        status: output.status.code().unwrap_or(SIGNALED),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_status() {
        let output = run("echo hello").unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
        assert!(output.success());
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let output = run("echo oops >&2; exit 3").unwrap();
        assert_eq!(output.status, 3);
        assert_eq!(output.stderr, "oops\n");
        assert!(!output.success());
    }
}
