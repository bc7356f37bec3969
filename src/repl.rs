use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;
use crate::config::Config;
use crate::environment::Environment;
use crate::error::ExecError;
use crate::executor::{ExecOutcome, Executor};
use crate::parser::{parse_line, ParseError};

/// Status reported for lines that do not parse.
pub const STATUS_SYNTAX_ERROR: i32 = 2;

/// Parse and run one line. Syntax errors are reported and become a status;
/// only fatal executor errors come back as `Err`.
pub fn run_line<E: Executor>(
    executor: &mut E,
    line: &str,
    env: &mut Environment,
) -> Result<ExecOutcome, ExecError> {
    let tree = match parse_line(line) {
        Ok(tree) => tree,
        Err(ParseError::EmptyInput) => return Ok(ExecOutcome::Code(0)),
        Err(e) => {
            eprintln!("tiny-shell: {}", e);
            return Ok(ExecOutcome::Code(STATUS_SYNTAX_ERROR));
        }
    };
    debug!(?tree, "parsed");
    executor.exec(&tree, env)
}

/// Read-eval loop over `input` until EOF or `exit`. Returns the status the
/// shell should terminate with.
pub fn run<E: Executor, R: BufRead>(
    executor: &mut E,
    env: &mut Environment,
    config: &Config,
    mut input: R,
) -> Result<i32, ExecError> {
    let show_prompt = io::stdin().is_terminal();
    let mut last = 0;
    let mut line = String::new();

    loop {
        if show_prompt {
            print!("{}", config.prompt);
            let _ = io::stdout().flush();
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break, // End with EOF (e.g. Ctrl+D)
            Ok(_) => {}
            Err(e) => {
                eprintln!("tiny-shell: read error: {}", e);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match run_line(executor, &line, env)? {
            ExecOutcome::Code(code) => last = code,
            ExecOutcome::Exit(code) => return Ok(code),
        }
    }
    Ok(last)
}
