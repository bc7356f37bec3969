use std::env;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tiny_shell_core::config::{Config, ConfigLoader, CONFIG_ENV_VAR};
use tiny_shell_core::environment::Environment;
use tiny_shell_core::executor::ShellExecutor;
use tiny_shell_core::repl;

struct Options {
    config: Option<String>,
    command: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        config: None,
        command: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                opts.config = Some(iter.next().ok_or("--config requires a path")?.clone());
            }
            "-c" => {
                opts.command = Some(iter.next().ok_or("-c requires a command argument")?.clone());
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(opts)
}

fn load_config(path: Option<String>) -> Result<Config, String> {
    match path.or_else(|| env::var(CONFIG_ENV_VAR).ok()) {
        Some(path) => ConfigLoader::load_from_file(&path).map_err(|e| format!("{}: {}", path, e)),
        None => Ok(ConfigLoader::default_config()),
    }
}

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("tiny-shell: {}", msg);
            eprintln!("usage: tiny-shell [--config PATH] [-c LINE]");
            return ExitCode::from(2);
        }
    };
    let config = match load_config(opts.config) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("tiny-shell: config: {}", msg);
            return ExitCode::from(2);
        }
    };
    init_tracing(&config.log_level);

    let mut env = Environment::new();
    config.apply_to(&mut env);
    let mut executor = ShellExecutor::with_processes();

    let result = match opts.command {
        Some(line) => repl::run_line(&mut executor, &line, &mut env).map(|outcome| outcome.code()),
        None => repl::run(&mut executor, &mut env, &config, io::stdin().lock()),
    };

    match result {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            eprintln!("tiny-shell: fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}
