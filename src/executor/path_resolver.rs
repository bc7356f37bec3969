use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use crate::environment::Environment;

/// Program lookup against the shell's own `PATH`, not the process one.
pub struct PathResolver;

impl PathResolver {
    pub fn resolve(&self, command: &str, env: &Environment) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }

        if command.contains('/') {
            let path = Path::new(command);
            if path.exists() {
                return Some(path.to_path_buf());
            } else {
                return None;
            }
        }

        let paths = env.get("PATH")?;
        env::split_paths(paths)
            .map(|dir| dir.join(command))
            .find(|full_path| is_executable_file(full_path))
    }
}

fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
