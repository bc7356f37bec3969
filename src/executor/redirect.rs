use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::trace;
use crate::ast::SimpleCommand;
use crate::error::RedirectError;

const CREATE_MODE: u32 = 0o644;

pub struct RedirectHandler;

impl RedirectHandler {
    /// Rebind stdin/stdout/stderr of the calling process to the command's
    /// redirection targets. Only called in a forked child before exec.
    pub fn apply(cmd: &SimpleCommand) -> Result<(), RedirectError> {
        if let Some(path) = &cmd.stdin {
            bind(open_input(path)?, libc::STDIN_FILENO)?;
        }

        match (&cmd.stdout, &cmd.stderr) {
            (Some(out), Some(err)) if out == err => {
                // One descriptor for both so the streams interleave in one file.
                let file = open_output(out, cmd.append_stdout)?;
                dup_onto(&file, libc::STDOUT_FILENO)?;
                dup_onto(&file, libc::STDERR_FILENO)?;
            }
            (out, err) => {
                if let Some(path) = out {
                    bind(open_output(path, cmd.append_stdout)?, libc::STDOUT_FILENO)?;
                }
                if let Some(path) = err {
                    bind(open_output(path, cmd.append_stderr)?, libc::STDERR_FILENO)?;
                }
            }
        }
        Ok(())
    }

    /// Create the output targets of a builtin without binding anything.
    pub fn touch_targets(cmd: &SimpleCommand) -> Result<(), RedirectError> {
        if let Some(path) = &cmd.stdout {
            open_output(path, cmd.append_stdout)?;
        }
        if let Some(path) = &cmd.stderr {
            open_output(path, cmd.append_stderr)?;
        }
        Ok(())
    }
}

fn open_input(path: &str) -> Result<File, RedirectError> {
    File::open(path).map_err(|source| RedirectError::Open {
        path: path.to_string(),
        source,
    })
}

fn open_output(path: &str, append: bool) -> Result<File, RedirectError> {
    let mut opts = OpenOptions::new();
    opts.create(true).mode(CREATE_MODE);
    if append {
        opts.append(true);
    } else {
        opts.write(true).truncate(true);
    }
    opts.open(path).map_err(|source| RedirectError::Open {
        path: path.to_string(),
        source,
    })
}

/// Duplicate `file` onto `fd`; the original descriptor is closed when `file` drops.
fn bind(file: File, fd: RawFd) -> Result<(), RedirectError> {
    dup_onto(&file, fd)
}

fn dup_onto(file: &File, fd: RawFd) -> Result<(), RedirectError> {
    trace!(from = file.as_raw_fd(), to = fd, "dup2");
    nix::unistd::dup2(file.as_raw_fd(), fd)
        .map(|_| ())
        .map_err(|source| RedirectError::Dup { fd, source })
}
