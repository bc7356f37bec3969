use std::io;
use nix::errno::Errno;
use thiserror::Error;

/// Failures of the executor itself. Any of these means the shell can no
/// longer drive processes and has to stop.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork: {0}")]
    Fork(#[source] Errno),
    #[error("pipe: {0}")]
    Pipe(#[source] Errno),
    #[error("waitpid: {0}")]
    Wait(#[source] Errno),
    #[error("dup2: {0}")]
    Dup(#[source] Errno),
}

/// Redirection setup failures, reported by the child that hit them.
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("{path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("dup2 onto fd {fd}: {source}")]
    Dup {
        fd: i32,
        #[source]
        source: Errno,
    },
}
