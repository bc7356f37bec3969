use std::collections::HashMap;
use std::env;
use tracing::{debug, warn};
use crate::ast::{SimpleCommand, VerbForm};
use crate::environment::Environment;
use super::executor::ExecOutcome;
use super::redirect::RedirectHandler;

/// Runs inside the shell process: builtins mutate the shell's own state.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], env: &mut Environment) -> ExecOutcome;

    /// Builtins that end the shell still run when a redirect target fails.
    fn terminates_shell(&self) -> bool {
        false
    }
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(ExitCommand { name: "exit" }));
        mgr.register(Box::new(ExitCommand { name: "quit" }));
        mgr.register(Box::new(CdCommand {}));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// `None` when `cmd` is not a builtin and has to run as a program.
    pub fn dispatch(&self, cmd: &SimpleCommand, env: &mut Environment) -> Option<ExecOutcome> {
        match cmd.verb.form() {
            VerbForm::Name(name) => {
                let builtin = self.commands.get(&name)?;
                debug!(builtin = %name, "running builtin");
                if let Err(e) = RedirectHandler::touch_targets(cmd) {
                    eprintln!("tiny-shell: {}", e);
                    if !builtin.terminates_shell() {
                        return Some(ExecOutcome::Code(1));
                    }
                }
                Some(builtin.run(&cmd.args, env))
            }
            VerbForm::Assignment { name, value } => Some(assign(&name, value.as_deref(), env)),
        }
    }
}

fn assign(name: &str, value: Option<&str>, env: &mut Environment) -> ExecOutcome {
    match value {
        Some(value) => {
            debug!(name, value, "assignment");
            env.assign(name, value);
            ExecOutcome::Code(0)
        }
        None => {
            warn!(name, "assignment without value");
            eprintln!("Invalid command.");
            ExecOutcome::Code(1)
        }
    }
}

pub struct ExitCommand {
    name: &'static str,
}

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        self.name
    }
    fn terminates_shell(&self) -> bool {
        true
    }
    fn run(&self, args: &[String], _env: &mut Environment) -> ExecOutcome {
        match args.first() {
            None => ExecOutcome::Exit(0),
            Some(arg) => match arg.parse::<i32>() {
                Ok(code) => ExecOutcome::Exit(code & 0xff),
                Err(_) => {
                    eprintln!("{}: {}: numeric argument required", self.name, arg);
                    ExecOutcome::Exit(2)
                }
            },
        }
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], env: &mut Environment) -> ExecOutcome {
        let Some(target) = args.first() else {
            eprintln!("cd: missing directory argument");
            return ExecOutcome::Code(1);
        };
        let previous = env::current_dir().ok();
        match env::set_current_dir(target) {
            Ok(_) => {
                if let Some(prev) = previous {
                    env.assign("OLDPWD", &prev.to_string_lossy());
                }
                if let Ok(cwd) = env::current_dir() {
                    env.assign("PWD", &cwd.to_string_lossy());
                }
                ExecOutcome::Code(0)
            }
            Err(e) => {
                warn!(target = %target, error = %e, "cd failed");
                eprintln!("cd: {}: {}", target, e);
                ExecOutcome::Code(1)
            }
        }
    }
}
