use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, RawFd};
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, trace};
use crate::ast::SimpleCommand;
use crate::environment::Environment;
use crate::error::ExecError;
use super::executor::{ExecStatus, ProcessHost, Wiring};
use super::path_resolver::PathResolver;
use super::redirect::RedirectHandler;

const STATUS_NOT_FOUND: i32 = 127;
const STATUS_NOT_EXECUTABLE: i32 = 126;

/// Both ends of an anonymous pipe; dropping it closes them.
pub struct PipeEnds {
    read: OwnedFd,
    write: OwnedFd,
}

/// Runs branches and programs as real child processes.
pub struct ForkHost {
    resolver: PathResolver,
}

impl Default for ForkHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ForkHost {
    pub fn new() -> Self {
        ForkHost {
            resolver: PathResolver,
        }
    }
}

impl ProcessHost for ForkHost {
    type Pipe = PipeEnds;
    type Child = Pid;

    fn pipe(&mut self) -> Result<PipeEnds, ExecError> {
        let (read, write) = unistd::pipe().map_err(ExecError::Pipe)?;
        trace!(read = read.as_raw_fd(), write = write.as_raw_fd(), "pipe");
        Ok(PipeEnds { read, write })
    }

    fn spawn<F>(
        &mut self,
        wiring: Wiring<'_, PipeEnds>,
        env: &Environment,
        body: F,
    ) -> Result<Pid, ExecError>
    where
        F: FnOnce(&mut Self, &mut Environment) -> ExecStatus,
    {
        flush_std_streams();
        match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
            ForkResult::Child => {
                restore_default_signals();
                let status = wire(&wiring).and_then(|()| {
                    let mut env = env.clone();
                    body(self, &mut env)
                });
                let code = match status {
                    Ok(outcome) => outcome.code(),
                    Err(e) => {
                        eprintln!("tiny-shell: {}", e);
                        1
                    }
                };
                exit_child(code)
            }
            ForkResult::Parent { child } => {
                debug!(pid = %child, "spawned branch");
                Ok(child)
            }
        }
    }

    fn wait(&mut self, child: Pid) -> Result<i32, ExecError> {
        wait_for(child)
    }

    fn run_external(&mut self, cmd: &SimpleCommand, env: &Environment) -> Result<i32, ExecError> {
        flush_std_streams();
        match unsafe { unistd::fork() }.map_err(ExecError::Fork)? {
            ForkResult::Child => exec_program(&self.resolver, cmd, env),
            ForkResult::Parent { child } => {
                debug!(pid = %child, verb = %cmd.verb.text(), "spawned program");
                wait_for(child)
            }
        }
    }
}

/// Connect the current (child) process to one end of the pipe and close
/// both original descriptors.
fn wire(wiring: &Wiring<'_, PipeEnds>) -> Result<(), ExecError> {
    let (pipe, from, to) = match wiring {
        Wiring::Inherit => return Ok(()),
        Wiring::StdoutTo(pipe) => (pipe, pipe.write.as_raw_fd(), libc::STDOUT_FILENO),
        Wiring::StdinFrom(pipe) => (pipe, pipe.read.as_raw_fd(), libc::STDIN_FILENO),
    };
    unistd::dup2(from, to).map_err(ExecError::Dup)?;
    // The OwnedFds are never dropped in the child, which leaves via exit_child.
    close_raw(pipe.read.as_raw_fd());
    close_raw(pipe.write.as_raw_fd());
    Ok(())
}

fn close_raw(fd: RawFd) {
    let _ = unistd::close(fd);
}

/// Child side of `run_external`: redirect, then replace the process image.
fn exec_program(resolver: &PathResolver, cmd: &SimpleCommand, env: &Environment) -> ! {
    restore_default_signals();
    if let Err(e) = RedirectHandler::apply(cmd) {
        eprintln!("tiny-shell: {}", e);
        exit_child(1);
    }

    let verb = cmd.verb.text();
    let Some(path) = resolver.resolve(&verb, env) else {
        eprintln!("Execution failed for '{}'", verb);
        exit_child(STATUS_NOT_FOUND);
    };

    let (path_c, argv, envp) = match exec_args(&path, cmd, env) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("tiny-shell: {}: {}", verb, e);
            exit_child(1);
        }
    };

    match unistd::execve(&path_c, &argv, &envp) {
        Ok(never) => match never {},
        Err(errno) => {
            eprintln!("Execution failed for '{}': {}", verb, errno.desc());
            exit_child(match errno {
                Errno::ENOENT | Errno::ENOTDIR => STATUS_NOT_FOUND,
                _ => STATUS_NOT_EXECUTABLE,
            });
        }
    }
}

type ExecArgs = (CString, Vec<CString>, Vec<CString>);

fn exec_args(
    path: &std::path::Path,
    cmd: &SimpleCommand,
    env: &Environment,
) -> Result<ExecArgs, std::ffi::NulError> {
    let path_c = CString::new(path.as_os_str().as_bytes())?;
    let argv = cmd
        .argv()
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()?;
    let envp = env
        .exported_vars()
        .into_iter()
        .map(|(k, v)| CString::new(format!("{}={}", k, v)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((path_c, argv, envp))
}

fn wait_for(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                trace!(pid = %pid, code, "reaped");
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(pid = %pid, ?signal, "child killed by signal");
                return Ok(128 + signal as i32);
            }
            // Stopped/continued notifications are not requested; keep waiting.
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}

/// The Rust runtime ignores SIGPIPE, and ignored signals survive execve.
/// Children get the default disposition back so writers die on a closed pipe.
fn restore_default_signals() {
    if let Err(e) = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        trace!(error = %e, "could not reset SIGPIPE");
    }
}

fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

fn exit_child(code: i32) -> ! {
    flush_std_streams();
    std::process::exit(code)
}
