use tracing::{debug, trace};
use crate::ast::{CommandTree, Operator, SimpleCommand};
use crate::environment::Environment;
use crate::error::ExecError;
use super::builtins::BuiltinManager;

pub type ExecStatus = Result<ExecOutcome, ExecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Ordinary status of a command.
    Code(i32),
    /// The shell itself has to terminate with this code.
    Exit(i32),
}

impl ExecOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExecOutcome::Code(code) | ExecOutcome::Exit(code) => code,
        }
    }

    pub fn is_exit(self) -> bool {
        matches!(self, ExecOutcome::Exit(_))
    }
}

/// How a spawned branch's standard streams are connected.
pub enum Wiring<'a, P> {
    Inherit,
    StdoutTo(&'a P),
    StdinFrom(&'a P),
}

/// Everything the interpreter needs from the operating system.
pub trait ProcessHost: Sized {
    type Pipe;
    type Child;

    fn pipe(&mut self) -> Result<Self::Pipe, ExecError>;

    /// Run `body` in a new process with its own copy of `env`. The body's
    /// outcome becomes that process's exit status.
    fn spawn<F>(
        &mut self,
        wiring: Wiring<'_, Self::Pipe>,
        env: &Environment,
        body: F,
    ) -> Result<Self::Child, ExecError>
    where
        F: FnOnce(&mut Self, &mut Environment) -> ExecStatus;

    /// Block until `child` terminates and return its status.
    fn wait(&mut self, child: Self::Child) -> Result<i32, ExecError>;

    /// Fork, redirect, exec and reap one external program.
    fn run_external(&mut self, cmd: &SimpleCommand, env: &Environment) -> Result<i32, ExecError>;
}

pub trait Executor {
    fn exec(&mut self, tree: &CommandTree, env: &mut Environment) -> ExecStatus;
}

pub struct TreeExecutor<H> {
    host: H,
}

impl<H: ProcessHost> TreeExecutor<H> {
    pub fn new(host: H) -> Self {
        TreeExecutor { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: ProcessHost> Executor for TreeExecutor<H> {
    fn exec(&mut self, tree: &CommandTree, env: &mut Environment) -> ExecStatus {
        interpret(&mut self.host, tree, env)
    }
}

/// Walk `tree`, returning the status of the last command that ran.
/// `Exit` stops the walk in the current process.
pub fn interpret<H: ProcessHost>(
    host: &mut H,
    tree: &CommandTree,
    env: &mut Environment,
) -> ExecStatus {
    match tree {
        CommandTree::Simple(cmd) => exec_simple(host, cmd, env),
        CommandTree::Compound { op, left, right } => {
            trace!(?op, "compound");
            match op {
                Operator::Sequential => {
                    let status = interpret(host, left, env)?;
                    if status.is_exit() {
                        return Ok(status);
                    }
                    interpret(host, right, env)
                }
                Operator::ConditionalZero => match interpret(host, left, env)? {
                    ExecOutcome::Code(0) => interpret(host, right, env),
                    other => Ok(other),
                },
                Operator::ConditionalNonZero => match interpret(host, left, env)? {
                    ExecOutcome::Code(code) if code != 0 => interpret(host, right, env),
                    other => Ok(other),
                },
                Operator::Parallel => exec_parallel(host, left, right, env),
                Operator::Pipe => exec_pipe(host, left, right, env),
            }
        }
    }
}

fn exec_simple<H: ProcessHost>(
    host: &mut H,
    cmd: &SimpleCommand,
    env: &mut Environment,
) -> ExecStatus {
    // Built-in command execution
    let builtin_manager = BuiltinManager::new();
    if let Some(outcome) = builtin_manager.dispatch(cmd, env) {
        return Ok(outcome);
    }

    let code = host.run_external(cmd, env)?;
    debug!(verb = %cmd.verb.text(), code, "command finished");
    Ok(ExecOutcome::Code(code))
}

fn exec_parallel<H: ProcessHost>(
    host: &mut H,
    left: &CommandTree,
    right: &CommandTree,
    env: &Environment,
) -> ExecStatus {
    let left_child = host.spawn(Wiring::Inherit, env, |h, e| interpret(h, left, e))?;
    let right_child = host.spawn(Wiring::Inherit, env, |h, e| interpret(h, right, e))?;

    let right_code = host.wait(right_child)?;
    let left_code = host.wait(left_child)?;
    debug!(left_code, right_code, "parallel branches reaped");
    Ok(ExecOutcome::Code(right_code))
}

fn exec_pipe<H: ProcessHost>(
    host: &mut H,
    left: &CommandTree,
    right: &CommandTree,
    env: &Environment,
) -> ExecStatus {
    let pipe = host.pipe()?;
    let writer = host.spawn(Wiring::StdoutTo(&pipe), env, |h, e| interpret(h, left, e))?;
    let reader = host.spawn(Wiring::StdinFrom(&pipe), env, |h, e| interpret(h, right, e))?;
    // Both ends closed here so the reader sees EOF once the writer is done.
    drop(pipe);

    let right_code = host.wait(reader)?;
    let left_code = host.wait(writer)?;
    debug!(left_code, right_code, "pipe branches reaped");
    Ok(ExecOutcome::Code(right_code))
}
