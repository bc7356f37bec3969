use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;
use tiny_shell_core::environment::Environment;
use tiny_shell_core::executor::{ExecOutcome, ShellExecutor};
use tiny_shell_core::repl::run_line;

static LOCK: Mutex<()> = Mutex::new(());

struct Sandbox {
    dir: TempDir,
    env: Environment,
    executor: ShellExecutor,
    _guard: MutexGuard<'static, ()>,
}

impl Sandbox {
    fn new() -> Self {
        let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
        Sandbox {
            dir: tempfile::tempdir().unwrap(),
            env: Environment::new(),
            executor: ShellExecutor::with_processes(),
            _guard: guard,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Absolute, quoted path for use inside a command line.
    fn p(&self, name: &str) -> String {
        format!("'{}'", self.path(name).display())
    }

    fn run(&mut self, line: &str) -> ExecOutcome {
        run_line(&mut self.executor, line, &mut self.env).unwrap()
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }
}

#[test]
fn sequence_runs_both_and_returns_right_status() {
    let mut sb = Sandbox::new();
    let line = format!("sh -c 'echo a > {}; exit 1' ; echo b > {}", sb.path("a").display(), sb.p("b"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("a"), "a\n");
    assert_eq!(sb.read("b"), "b\n");

    assert_eq!(sb.run("true ; false"), ExecOutcome::Code(1));
}

#[test]
fn and_runs_right_only_after_success() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run(&format!("false && echo x > {}", sb.p("no"))), ExecOutcome::Code(1));
    assert!(!sb.exists("no"));

    assert_eq!(sb.run(&format!("true && echo x > {}", sb.p("yes"))), ExecOutcome::Code(0));
    assert_eq!(sb.read("yes"), "x\n");
}

#[test]
fn or_runs_right_only_after_failure() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run(&format!("true || echo x > {}", sb.p("no"))), ExecOutcome::Code(0));
    assert!(!sb.exists("no"));

    assert_eq!(sb.run(&format!("false || echo x > {}", sb.p("yes"))), ExecOutcome::Code(0));
    assert_eq!(sb.read("yes"), "x\n");
}

#[test]
fn pipe_passes_output_and_returns_right_status() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run(&format!("printf foo | cat > {}", sb.p("out"))), ExecOutcome::Code(0));
    assert_eq!(sb.read("out"), "foo");

    assert_eq!(sb.run("true | false"), ExecOutcome::Code(1));
    assert_eq!(sb.run("false | true"), ExecOutcome::Code(0));
}

#[test]
fn pipes_chain() {
    let mut sb = Sandbox::new();
    let line = format!("printf 'b\\na\\nc\\n' | sort | head -n 1 > {}", sb.p("first"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("first"), "a\n");
}

#[test]
fn truncate_then_append() {
    let mut sb = Sandbox::new();
    sb.run(&format!("echo one > {}", sb.p("log")));
    sb.run(&format!("echo two > {}", sb.p("log")));
    assert_eq!(sb.read("log"), "two\n");

    sb.run(&format!("echo three >> {}", sb.p("log")));
    assert_eq!(sb.read("log"), "two\nthree\n");
}

#[test]
fn stdin_redirection() {
    let mut sb = Sandbox::new();
    fs::write(sb.path("in"), "from file\n").unwrap();
    let line = format!("cat < {} > {}", sb.p("in"), sb.p("out"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("out"), "from file\n");
}

#[test]
fn missing_stdin_file_fails_the_command_only() {
    let mut sb = Sandbox::new();
    let line = format!("cat < {} ; echo still > {}", sb.p("absent"), sb.p("after"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("after"), "still\n");
    assert_ne!(sb.run(&format!("cat < {}", sb.p("absent"))), ExecOutcome::Code(0));
}

#[test]
fn stderr_redirection_and_combined() {
    let mut sb = Sandbox::new();
    sb.run(&format!("sh -c 'echo e >&2' 2> {}", sb.p("err")));
    assert_eq!(sb.read("err"), "e\n");

    sb.run(&format!("sh -c 'echo e2 >&2' 2>> {}", sb.p("err")));
    assert_eq!(sb.read("err"), "e\ne2\n");

    sb.run(&format!("sh -c 'echo o; echo e >&2' &> {}", sb.p("both")));
    assert_eq!(sb.read("both"), "o\ne\n");
}

#[test]
fn separate_stdout_and_stderr_files() {
    let mut sb = Sandbox::new();
    sb.run(&format!("sh -c 'echo o; echo e >&2' > {} 2> {}", sb.p("o"), sb.p("e")));
    assert_eq!(sb.read("o"), "o\n");
    assert_eq!(sb.read("e"), "e\n");
}

#[test]
fn cd_to_missing_directory_fails_and_keeps_cwd() {
    let mut sb = Sandbox::new();
    let before = env::current_dir().unwrap();
    assert_eq!(sb.run("cd nonexistent_dir_for_tiny_shell"), ExecOutcome::Code(1));
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn cd_affects_later_commands() {
    let mut sb = Sandbox::new();
    let before = env::current_dir().unwrap();
    let target = sb.dir.path().canonicalize().unwrap();
    let status = sb.run(&format!("cd '{}' && pwd > here", target.display()));
    env::set_current_dir(&before).unwrap();

    assert_eq!(status, ExecOutcome::Code(0));
    assert_eq!(sb.read("here").trim_end(), target.to_str().unwrap());
}

#[test]
fn cd_inside_pipe_branch_does_not_move_the_shell() {
    let mut sb = Sandbox::new();
    let before = env::current_dir().unwrap();
    sb.run("cd / | true");
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
fn assignment_reaches_children() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run("TINY_SHELL_NAME=value"), ExecOutcome::Code(0));
    let line = format!("sh -c 'printf %s \"$TINY_SHELL_NAME\"' > {}", sb.p("out"));
    sb.run(&line);
    assert_eq!(sb.read("out"), "value");
}

#[test]
fn assignment_without_value_is_rejected() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run("TINY_SHELL_EMPTY="), ExecOutcome::Code(1));
    assert_eq!(sb.env.get("TINY_SHELL_EMPTY"), None);
}

#[test]
fn exit_stops_everything_after_it() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run(&format!("exit ; echo x > {}", sb.p("no"))), ExecOutcome::Exit(0));
    assert!(!sb.exists("no"));

    let status = sb.run(&format!("echo x > {} ; quit 4", sb.p("yes")));
    assert_eq!(status, ExecOutcome::Exit(4));
    assert!(sb.exists("yes"));
}

#[test]
fn exit_honours_redirection_targets() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run(&format!("exit > {}", sb.p("touched"))), ExecOutcome::Exit(0));
    assert_eq!(sb.read("touched"), "");
}

#[test]
fn unknown_program_reports_127_and_shell_continues() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run("tiny-shell-no-such-program"), ExecOutcome::Code(127));
    let line = format!("tiny-shell-no-such-program ; echo ok > {}", sb.p("ok"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("ok"), "ok\n");
}

#[test]
fn parallel_waits_for_both_branches() {
    let mut sb = Sandbox::new();
    let line = format!(
        "sh -c 'sleep 0.2; echo left > {}' & sh -c 'exit 5'",
        sb.path("left").display()
    );
    assert_eq!(sb.run(&line), ExecOutcome::Code(5));
    assert_eq!(sb.read("left"), "left\n");
}

#[test]
fn syntax_error_is_a_status_not_a_failure() {
    let mut sb = Sandbox::new();
    assert_eq!(sb.run("echo |"), ExecOutcome::Code(2));
    assert_eq!(sb.run("   "), ExecOutcome::Code(0));
}

#[test]
fn exit_inside_a_branch_only_ends_that_branch() {
    let mut sb = Sandbox::new();
    let line = format!("true | exit 3 ; echo after > {}", sb.p("after"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("after"), "after\n");

    assert_eq!(sb.run("true | exit 3"), ExecOutcome::Code(3));
    assert_eq!(sb.run("true & quit 4"), ExecOutcome::Code(4));
}

#[test]
fn exit_with_unwritable_target_still_exits() {
    let mut sb = Sandbox::new();
    let line = format!("exit 5 > {} ; echo x > {}", sb.p("missing/x"), sb.p("no"));
    assert_eq!(sb.run(&line), ExecOutcome::Exit(5));
    assert!(!sb.exists("no"));
}

#[test]
fn piped_writer_is_killed_when_reader_exits() {
    let mut sb = Sandbox::new();
    let line = format!("yes 2> {} | head -n 1 > {}", sb.p("err"), sb.p("out"));
    assert_eq!(sb.run(&line), ExecOutcome::Code(0));
    assert_eq!(sb.read("out"), "y\n");
    assert_eq!(sb.read("err"), "");
}
