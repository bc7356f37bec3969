mod executor;
mod builtins;
mod path_resolver;
mod process;
mod redirect;

pub use executor::{interpret, Executor, ExecOutcome, ExecStatus, ProcessHost, TreeExecutor, Wiring};
pub use builtins::{BuiltinCommand, BuiltinManager};
pub use path_resolver::PathResolver;
pub use process::{ForkHost, PipeEnds};
pub use redirect::RedirectHandler;

/// Executor backed by real processes.
pub type ShellExecutor = TreeExecutor<ForkHost>;

impl ShellExecutor {
    pub fn with_processes() -> Self {
        TreeExecutor::new(ForkHost::new())
    }
}
